//! # fieldsurvey-export
//!
//! Turns a survey [`Form`] into a styled one-sheet Excel workbook.
//!
//! The pipeline has three stages, each a plain function of its input:
//! - [`layout`]: form to grid of values, merges and dimensions
//! - [`style`]: grid to a dense per-cell style table
//! - [`excel`]: styled grid to xlsx bytes
//!
//! Two thin adapters sit on top: [`XlsxExporter::export_document`] returns
//! bytes plus the download file name, and [`XlsxExporter::export_serialized`]
//! takes form JSON and returns a `{success, data?, error?}` envelope with the
//! workbook as base64.
//!
//! ## Example
//!
//! ```rust
//! use fieldsurvey_core::{EntryDraft, FormStore, MemoryFormStore, NewForm, Observation};
//! use fieldsurvey_export::XlsxExporter;
//!
//! let mut store = MemoryFormStore::new();
//! let form = store.create_form(NewForm {
//!     name: "早班".into(),
//!     branch_code: "755A".into(),
//!     survey_date: "2024-05-20".into(),
//!     courier_code: "C0192".into(),
//!     ..NewForm::default()
//! });
//! store
//!     .add_entry(&form.metadata.id, EntryDraft::new("1234").observe(Observation::AddressDelivered, true))
//!     .unwrap();
//!
//! let form = store.get_form(&form.metadata.id).unwrap();
//! let document = XlsxExporter::new().export_document(&form).unwrap();
//! assert_eq!(document.file_name, "早班_755A_2024-05-20_C0192.xlsx");
//! assert_eq!(&document.bytes[0..2], b"PK");
//! ```

pub mod excel;
pub mod layout;
pub mod style;
pub mod transport;

pub use excel::{XlsxDocument, XlsxExporter, DEFAULT_FORM_LABEL, SHEET_NAME, XLSX_MIME_TYPE};
pub use layout::{build_layout, CellRef, CellValue, Layout, MergeRegion};
pub use style::{CellRole, CellStyle, StyleApplier, StyleTheme, StyledSheet};
pub use transport::{parse_form, ExportResponse};

pub use fieldsurvey_core::{ExportError, Exporter, Form};
