use data_report::domain::model::{Cell, ColumnKind};
use data_report::{FileLoader, ReportError};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

/// Minimal single-sheet workbook. Text cells are written inline so no shared
/// strings part is needed.
fn xlsx_fixture(rows: &[Vec<&str>]) -> Vec<u8> {
    let mut sheet_rows = String::new();
    for (r, row) in rows.iter().enumerate() {
        sheet_rows.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, value) in row.iter().enumerate() {
            let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
            if value.parse::<f64>().is_ok() {
                sheet_rows.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, value));
            } else {
                sheet_rows.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    reference, value
                ));
            }
        }
        sheet_rows.push_str("</row>");
    }

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
                .to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
                .to_string(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                sheet_rows
            ),
        ),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file::<_, ()>(name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_csv_row_count() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "sales_data.csv",
        b"Date,Product,Units Sold,Unit Price\n2024-01-01,Widget,2,10\n2024-01-02,Gadget,3,5\n2024-01-03,Widget,1,10\n",
    );

    let table = FileLoader::load(&path).unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(
        table.column_names(),
        vec!["Date", "Product", "Units Sold", "Unit Price"]
    );
    assert_eq!(table.column("Units Sold").unwrap().kind(), ColumnKind::Numeric);
}

#[test]
fn test_xlsx_row_count() {
    let dir = TempDir::new().unwrap();
    let bytes = xlsx_fixture(&[
        vec!["Product", "Units Sold", "Unit Price"],
        vec!["Widget", "2", "10.5"],
        vec!["Gadget", "3", "5"],
    ]);
    let path = write_file(&dir, "sales.xlsx", &bytes);

    let table = FileLoader::load(&path).unwrap();

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_names(), vec!["Product", "Units Sold", "Unit Price"]);
    assert_eq!(table.column("Units Sold").unwrap().cells()[1], Cell::Int(3));
    assert_eq!(table.column("Unit Price").unwrap().cells()[0], Cell::Float(10.5));
}

#[test]
fn test_uppercase_extension() {
    let dir = TempDir::new().unwrap();
    let bytes = xlsx_fixture(&[vec!["a"], vec!["1"]]);
    let path = write_file(&dir, "REPORT.XLSX", &bytes);

    assert_eq!(FileLoader::load(&path).unwrap().row_count(), 1);
}

#[test]
fn test_json_row_count() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "records.json",
        br#"[{"Product": "Widget", "Units Sold": 2}, {"Product": "Gadget", "Units Sold": 3}]"#,
    );

    let table = FileLoader::load(&path).unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_names(), vec!["Product", "Units Sold"]);
}

#[test]
fn test_json_booleans_stay_boolean() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "flags.json", br#"[{"active": true}, {"active": null}]"#);

    let column = FileLoader::load(&path).unwrap().column("active").unwrap().clone();
    assert_eq!(column.cells(), &[Cell::Bool(true), Cell::Null]);
    assert_eq!(column.kind(), ColumnKind::Boolean);
}

#[test]
fn test_txt_tab_path() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.txt", b"name\tscore\nann\t1\nbob\t2\n");

    let table = FileLoader::load(&path).unwrap();
    assert_eq!(table.column_names(), vec!["name", "score"]);
    assert_eq!(table.row_count(), 2);
}

#[test]
fn test_txt_comma_fallback() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.txt", b"name,score\nann,1\nbob,2\ncid,3\n");

    let table = FileLoader::load(&path).unwrap();
    assert_eq!(table.column_names(), vec!["name", "score"]);
    assert_eq!(table.row_count(), 3);
}

#[test]
fn test_malformed_txt_is_load_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.txt", b"name,score\nann,1,extra\n");

    let err = FileLoader::load(&path).unwrap_err();
    assert!(matches!(err, ReportError::LoadError { ref path, .. } if path.ends_with("data.txt")));
}

#[test]
fn test_unsupported_extension() {
    let err = FileLoader::load(Path::new("does/not/exist.xml")).unwrap_err();
    assert!(matches!(
        err,
        ReportError::UnsupportedFormat { ref extension } if extension == ".xml"
    ));
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    let err = FileLoader::load(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, ReportError::LoadError { .. }));
}

#[test]
fn test_corrupt_xlsx_is_load_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.xlsx", b"this is not a zip archive");

    assert!(matches!(
        FileLoader::load(&path),
        Err(ReportError::LoadError { .. })
    ));
}
