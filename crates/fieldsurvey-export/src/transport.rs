//! Serialized export path
//!
//! Takes a form as JSON text and answers with `{success, data?, error?}`,
//! where `data` is the base64 of the workbook. Failures come back as values;
//! nothing on this path returns `Err` or panics on bad input.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use fieldsurvey_core::{ExportError, Form};

use crate::excel::XlsxExporter;

/// Transport envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<String, ExportError>> for ExportResponse {
    fn from(result: Result<String, ExportError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Parse form JSON, reporting problems as `MalformedInput`
pub fn parse_form(text: &str) -> Result<Form, ExportError> {
    serde_json::from_str(text).map_err(|e| ExportError::MalformedInput(e.to_string()))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

impl XlsxExporter {
    /// Workbook bytes as base64
    pub fn render_base64(&self, form: &Form) -> Result<String, ExportError> {
        self.render_to_bytes(form).map(|bytes| encode_base64(&bytes))
    }

    /// Serialized form in, transport envelope out
    pub fn export_serialized(&self, form_json: &str) -> ExportResponse {
        let result = parse_form(form_json).and_then(|form| self.render_base64(&form));
        if let Err(e) = &result {
            tracing::error!(error = %e, "serialized export failed");
        }
        result.into()
    }
}
