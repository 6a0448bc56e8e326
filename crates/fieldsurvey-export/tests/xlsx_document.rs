//! Inspect the workbook package produced by the exporter

use std::io::{Cursor, Read};

use chrono::{TimeZone, Utc};
use fieldsurvey_core::{Form, FormEntry, FormMetadata, Observation};
use fieldsurvey_export::{ExportResponse, Exporter, XlsxExporter};
use pretty_assertions::assert_eq;

fn survey(entries: Vec<FormEntry>) -> Form {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Form {
        metadata: FormMetadata {
            id: "form-1704067200000".into(),
            name: "A".into(),
            city_name: "成都".into(),
            survey_date: "2024-01-01".into(),
            branch_code: "B1".into(),
            area_type: "工业区".into(),
            courier_code: "C9".into(),
            created_at: at,
            updated_at: at,
        },
        entries,
    }
}

fn two_entries() -> Vec<FormEntry> {
    vec![
        FormEntry::new("entry-1", "1234")
            .observe(Observation::AddressDelivered, true)
            .observe(Observation::CustomerInteraction, true)
            .observe(Observation::CustomerInteractionReturn, true),
        FormEntry::new("entry-2", "AB12").notes("z"),
    ]
}

fn part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

#[test]
fn workbook_names_the_sheet() {
    let bytes = XlsxExporter::new().render_to_bytes(&survey(two_entries())).unwrap();
    let workbook = part(&bytes, "xl/workbook.xml");
    assert!(workbook.contains(r#"name="表单数据""#));
}

#[test]
fn sheet_lists_the_fixed_merges() {
    let bytes = XlsxExporter::new().render_to_bytes(&survey(two_entries())).unwrap();
    let sheet = part(&bytes, "xl/worksheets/sheet1.xml");

    assert_eq!(sheet.matches("<mergeCell ").count(), 14);
    for range in [
        "A1:H1", "A2:H2", "A3:B3", "C3:H3", "A4:B4", "C4:D4", "F4:H4", "A5:B5", "C5:D5", "F5:H5",
        "C6:G6", "A6:A7", "B6:B7", "H6:H7",
    ] {
        assert!(
            sheet.contains(&format!(r#"<mergeCell ref="{range}"/>"#)),
            "missing merge {range}"
        );
    }
}

#[test]
fn sheet_has_one_row_per_entry() {
    let bytes = XlsxExporter::new().render_to_bytes(&survey(two_entries())).unwrap();
    let sheet = part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<row r="9""#));
    assert!(!sheet.contains(r#"<row r="10""#));
}

#[test]
fn empty_form_keeps_header_block() {
    let bytes = XlsxExporter::new().render_to_bytes(&survey(vec![])).unwrap();
    let sheet = part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<row r="7""#));
    assert!(!sheet.contains(r#"<row r="8""#));
    assert_eq!(sheet.matches("<mergeCell ").count(), 14);
}

#[test]
fn shared_strings_carry_title_metadata_and_glyphs() {
    let bytes = XlsxExporter::new().render_to_bytes(&survey(two_entries())).unwrap();
    let strings = part(&bytes, "xl/sharedStrings.xml");
    for text in ["末端派送调研表", "成都", "工业区", "AB12", "✓", "✗"] {
        assert!(strings.contains(text), "missing {text}");
    }
}

#[test]
fn header_rows_have_fixed_heights() {
    let bytes = XlsxExporter::new().render_to_bytes(&survey(two_entries())).unwrap();
    let sheet = part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"ht="100""#));
    assert!(sheet.contains(r#"ht="34""#));
}

#[test]
fn trait_export_and_serialized_export_agree_on_content() {
    let form = survey(two_entries());
    let document = XlsxExporter::new().export(&form).unwrap();
    assert_eq!(document.file_name, "A_B1_2024-01-01_C9.xlsx");

    let json = serde_json::to_string(&form).unwrap();
    let response: ExportResponse = XlsxExporter::new().export_serialized(&json);
    assert!(response.success);

    use base64::Engine;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(response.data.unwrap())
        .unwrap();
    assert_eq!(
        part(&decoded, "xl/worksheets/sheet1.xml"),
        part(&document.bytes, "xl/worksheets/sheet1.xml")
    );
}
