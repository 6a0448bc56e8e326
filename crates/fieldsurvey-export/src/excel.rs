//! Excel emission
//!
//! Writes a [`StyledSheet`] into a one-sheet workbook with rust_xlsxwriter.
//! Merge regions are written with `merge_range`, so the anchor's format covers
//! the whole region; every other cell of the used range is written on its own,
//! blanks included, so that each one carries its border.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use fieldsurvey_core::{ExportError, Exporter, Form, FormMetadata};

use crate::layout::{build_layout, CellValue, Layout};
use crate::style::{BorderLine, CellStyle, HAlign, StyleApplier, StyleTheme, StyledSheet, VAlign};

/// Name of the only worksheet
pub const SHEET_NAME: &str = "表单数据";

/// Filename prefix used when a form has no name
pub const DEFAULT_FORM_LABEL: &str = "表单";

pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Workbook bytes with the name they should be saved under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XlsxDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl XlsxDocument {
    /// Write into `dir` under the document's own file name
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Survey form to xlsx exporter
#[derive(Clone, Debug)]
pub struct XlsxExporter {
    pub theme: StyleTheme,
    /// Filename prefix for unnamed forms
    pub default_label: String,
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self {
            theme: StyleTheme::default(),
            default_label: DEFAULT_FORM_LABEL.into(),
        }
    }
}

impl XlsxExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the style constants
    pub fn theme(mut self, theme: StyleTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }

    /// `{name}_{branchCode}_{surveyDate}_{courierCode}.xlsx`
    pub fn file_name(&self, metadata: &FormMetadata) -> String {
        let label = if metadata.name.is_empty() {
            self.default_label.as_str()
        } else {
            metadata.name.as_str()
        };
        format!(
            "{label}_{}_{}_{}.xlsx",
            metadata.branch_code, metadata.survey_date, metadata.courier_code
        )
    }

    /// Layout and style, without touching the xlsx format
    pub fn build_sheet(&self, form: &Form) -> StyledSheet {
        StyleApplier::new(self.theme.clone()).apply(build_layout(form))
    }

    /// Generate workbook bytes
    pub fn render_to_bytes(&self, form: &Form) -> Result<Vec<u8>, ExportError> {
        tracing::debug!(
            form_id = %form.metadata.id,
            entries = form.entries.len(),
            "exporting form"
        );
        let sheet = self.build_sheet(form);

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(xlsx_error)?;
        write_sheet(worksheet, &sheet)?;

        workbook
            .save_to_buffer()
            .map_err(|e| ExportError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Bytes plus download name
    pub fn export_document(&self, form: &Form) -> Result<XlsxDocument, ExportError> {
        let bytes = self.render_to_bytes(form)?;
        Ok(XlsxDocument {
            file_name: self.file_name(&form.metadata),
            bytes,
        })
    }
}

impl Exporter for XlsxExporter {
    type Output = XlsxDocument;

    fn export(&self, form: &Form) -> Result<XlsxDocument, ExportError> {
        self.export_document(form)
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &StyledSheet) -> Result<(), ExportError> {
    let layout = &sheet.layout;

    for merge in &layout.merges {
        let anchor = merge.anchor();
        let text = layout
            .cell(anchor.row, anchor.col)
            .map(display_text)
            .unwrap_or_default();
        let format = format_at(sheet, anchor.row, anchor.col);
        worksheet
            .merge_range(
                row_num(merge.first_row)?,
                col_num(merge.first_col)?,
                row_num(merge.last_row)?,
                col_num(merge.last_col)?,
                &text,
                &format,
            )
            .map_err(xlsx_error)?;
    }

    for (r, cells) in layout.grid.iter().enumerate() {
        for (c, value) in cells.iter().enumerate() {
            if layout.merge_at(r, c).is_some() {
                continue;
            }
            let format = format_at(sheet, r, c);
            let (row, col) = (row_num(r)?, col_num(c)?);
            let written = match value {
                CellValue::Number(n) => {
                    worksheet.write_number_with_format(row, col, *n, &format)
                }
                CellValue::Text(s) if !s.is_empty() => {
                    worksheet.write_string_with_format(row, col, s, &format)
                }
                CellValue::Text(_) | CellValue::Blank => worksheet.write_blank(row, col, &format),
            };
            written.map_err(xlsx_error)?;
        }
    }

    write_dimensions(worksheet, layout)
}

fn write_dimensions(worksheet: &mut Worksheet, layout: &Layout) -> Result<(), ExportError> {
    for (c, width) in layout.col_widths.iter().enumerate() {
        worksheet
            .set_column_width(col_num(c)?, *width)
            .map_err(xlsx_error)?;
    }
    for (r, height) in layout.row_heights.iter().enumerate() {
        worksheet
            .set_row_height(row_num(r)?, *height)
            .map_err(xlsx_error)?;
    }
    Ok(())
}

fn display_text(value: &CellValue) -> String {
    match value {
        CellValue::Blank => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => n.to_string(),
    }
}

fn format_at(sheet: &StyledSheet, row: usize, col: usize) -> Format {
    sheet.style(row, col).map(to_format).unwrap_or_default()
}

/// Translate a format-independent style into an xlsx format
pub fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    if let Some(line) = style.border {
        format = format.set_border(match line {
            BorderLine::None => FormatBorder::None,
            BorderLine::Thin => FormatBorder::Thin,
            BorderLine::Medium => FormatBorder::Medium,
            BorderLine::Thick => FormatBorder::Thick,
        });
    }
    if let Some(align) = style.horizontal {
        format = format.set_align(match align {
            HAlign::Left => FormatAlign::Left,
            HAlign::Center => FormatAlign::Center,
            HAlign::Right => FormatAlign::Right,
        });
    }
    if let Some(align) = style.vertical {
        format = format.set_align(match align {
            VAlign::Top => FormatAlign::Top,
            VAlign::Center => FormatAlign::VerticalCenter,
            VAlign::Bottom => FormatAlign::Bottom,
        });
    }
    if style.wrap {
        format = format.set_text_wrap();
    }

    if let Some(name) = &style.font.name {
        format = format.set_font_name(name);
    }
    if let Some(size) = style.font.size {
        format = format.set_font_size(size);
    }
    if style.font.bold {
        format = format.set_bold();
    }
    if let Some(rgb) = style.fill {
        format = format.set_background_color(Color::RGB(rgb));
    }

    format
}

fn row_num(row: usize) -> Result<u32, ExportError> {
    u32::try_from(row).map_err(|_| ExportError::Format(format!("Row {row} out of range")))
}

fn col_num(col: usize) -> Result<u16, ExportError> {
    u16::try_from(col).map_err(|_| ExportError::Format(format!("Column {col} out of range")))
}

fn xlsx_error(e: XlsxError) -> ExportError {
    ExportError::Format(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fieldsurvey_core::{FormEntry, Observation};
    use pretty_assertions::assert_eq;

    fn form(name: &str) -> Form {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        Form {
            metadata: FormMetadata {
                id: "form-1704101400000".into(),
                name: name.into(),
                city_name: "杭州".into(),
                survey_date: "2024-01-01".into(),
                branch_code: "B1".into(),
                area_type: "住宅区".into(),
                courier_code: "C9".into(),
                created_at: at,
                updated_at: at,
            },
            entries: vec![FormEntry::new("entry-1", "1234")
                .observe(Observation::AddressDelivered, true)
                .notes("z")],
        }
    }

    #[test]
    fn file_name_joins_metadata() {
        let exporter = XlsxExporter::new();
        assert_eq!(exporter.file_name(&form("A").metadata), "A_B1_2024-01-01_C9.xlsx");
    }

    #[test]
    fn file_name_falls_back_to_default_label() {
        let exporter = XlsxExporter::new();
        assert_eq!(exporter.file_name(&form("").metadata), "表单_B1_2024-01-01_C9.xlsx");

        let relabelled = XlsxExporter::new().default_label("survey");
        assert_eq!(relabelled.file_name(&form("").metadata), "survey_B1_2024-01-01_C9.xlsx");
    }

    #[test]
    fn produces_xlsx_bytes() {
        let bytes = XlsxExporter::new().render_to_bytes(&form("A")).unwrap();
        // XLSX files start with PK (ZIP header)
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn empty_form_still_exports() {
        let mut empty = form("A");
        empty.entries.clear();
        let document = XlsxExporter::new().export(&empty).unwrap();
        assert_eq!(&document.bytes[0..2], b"PK");
        assert_eq!(document.file_name, "A_B1_2024-01-01_C9.xlsx");
    }

    #[test]
    fn write_to_dir_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let document = XlsxExporter::new().export_document(&form("A")).unwrap();
        let path = document.write_to_dir(dir.path()).unwrap();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("A_B1_2024-01-01_C9.xlsx"));
        assert_eq!(std::fs::read(&path).unwrap(), document.bytes);
    }

    #[test]
    fn number_cells_display_without_fraction() {
        assert_eq!(display_text(&CellValue::Number(3.0)), "3");
        assert_eq!(display_text(&CellValue::Blank), "");
    }
}
