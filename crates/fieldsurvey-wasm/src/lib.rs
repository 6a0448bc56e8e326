//! WebAssembly bindings for the fieldsurvey export engine
//!
//! JavaScript-callable functions that turn form JSON (the shape the survey
//! front end keeps in local storage) into an Excel workbook, either as bytes,
//! as a browser download, or as a base64 transport envelope.

use wasm_bindgen::prelude::*;

use fieldsurvey_core::{ExportError, Form};
use fieldsurvey_export::{parse_form, ExportResponse, XlsxDocument, XlsxExporter, XLSX_MIME_TYPE};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Export form JSON to XLSX bytes
///
/// # Returns
/// The workbook as a `Uint8Array`, or an error string
#[wasm_bindgen]
pub fn export_xlsx(form_json: &str) -> Result<Vec<u8>, JsValue> {
    document_for(form_json)
        .map(|document| document.bytes)
        .map_err(to_js_error)
}

/// Download name for a form: `{name}_{branchCode}_{surveyDate}_{courierCode}.xlsx`
#[wasm_bindgen]
pub fn export_file_name(form_json: &str) -> Result<String, JsValue> {
    let form = parse_form(form_json).map_err(to_js_error)?;
    Ok(file_name_for(&form))
}

/// Export form JSON and hand the workbook to the browser as a download
#[wasm_bindgen]
pub fn download_xlsx(form_json: &str) -> Result<(), JsValue> {
    let document = document_for(form_json).map_err(to_js_error)?;
    trigger_download(&document)
}

/// Export form JSON to a `{success, data?, error?}` object with base64 data
///
/// Never throws; failures are reported through `success: false`.
#[wasm_bindgen]
pub fn export_xlsx_base64(form_json: &str) -> JsValue {
    let response = serialized_response(form_json);
    serde_wasm_bindgen::to_value(&response).unwrap_or_else(|e| JsValue::from_str(&e.to_string()))
}

fn document_for(form_json: &str) -> Result<XlsxDocument, ExportError> {
    let form = parse_form(form_json)?;
    XlsxExporter::new().export_document(&form)
}

fn file_name_for(form: &Form) -> String {
    XlsxExporter::new().file_name(&form.metadata)
}

fn serialized_response(form_json: &str) -> ExportResponse {
    XlsxExporter::new().export_serialized(form_json)
}

fn to_js_error(e: ExportError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Blob + object URL + temporary anchor click
fn trigger_download(document: &XlsxDocument) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
    let dom = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document available"))?;
    let body = dom
        .body()
        .ok_or_else(|| JsValue::from_str("No document body available"))?;

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(document.bytes.as_slice()));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(XLSX_MIME_TYPE);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor: web_sys::HtmlAnchorElement = dom
        .create_element("a")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Failed to create download link"))?;
    anchor.set_href(&url);
    anchor.set_download(&document.file_name);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();

    web_sys::Url::revoke_object_url(&url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FORM_JSON: &str = r#"{
        "id": "form-1704067200000",
        "name": "",
        "cityName": "武汉",
        "surveyDate": "2024-01-01",
        "branchCode": "B1",
        "areaType": "住宅区",
        "courierCode": "C9",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z",
        "entries": [{
            "id": "entry-1704067260000",
            "trackingNumberLastFour": "1234",
            "addressDelivered": true,
            "thirdPartyDelivery": false,
            "customerInteraction": true,
            "customerInteractionSending": false,
            "customerInteractionReturn": true,
            "notes": "",
            "createdAt": "2024-01-01T00:01:00Z"
        }]
    }"#;

    // JsValue is unavailable off wasm32, so these tests stay on the Ok paths
    // and the plain-Rust helpers.

    #[test]
    fn export_xlsx_returns_zip_bytes() {
        let bytes = export_xlsx(FORM_JSON).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn file_name_uses_default_label_for_unnamed_form() {
        let name = export_file_name(FORM_JSON).unwrap();
        assert_eq!(name, "表单_B1_2024-01-01_C9.xlsx");
    }

    #[test]
    fn serialized_response_reports_parse_failures() {
        let response = serialized_response("{\"entries\": 5}");
        assert!(!response.success);
        assert!(response.error.is_some_and(|e| e.starts_with("Malformed input")));

        let response = serialized_response(FORM_JSON);
        assert!(response.success);
        assert!(response.data.is_some_and(|d| d.starts_with("UEs")));
    }

    #[test]
    fn document_for_rejects_bad_json() {
        assert!(matches!(
            document_for("nope"),
            Err(ExportError::MalformedInput(_))
        ));
    }
}
