//! Minimal single-sheet XLSX writer: the OOXML parts zipped by hand, the
//! reverse of reading `word/document.xml` out of a .docx.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

/// A spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// Write `header` plus `rows` as the only sheet of a new workbook at `path`.
pub fn write_sheet(path: &Path, sheet_name: &str, header: &[&str], rows: &[Vec<Cell>]) -> Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", deflated)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", deflated)?;
    zip.write_all(ROOT_RELS.as_bytes())?;

    zip.start_file("xl/workbook.xml", deflated)?;
    zip.write_all(workbook_xml(sheet_name).as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", deflated)?;
    zip.write_all(WORKBOOK_RELS.as_bytes())?;

    zip.start_file("xl/worksheets/sheet1.xml", deflated)?;
    zip.write_all(sheet_xml(header, rows).as_bytes())?;

    zip.finish()?;
    Ok(())
}

// ---- Internal helpers ----

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        escape(sheet_name)
    )
}

fn sheet_xml(header: &[&str], rows: &[Vec<Cell>]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let header_row: Vec<Cell> = header.iter().map(|h| Cell::Text(h.to_string())).collect();
    for (r, row) in std::iter::once(&header_row).chain(rows.iter()).enumerate() {
        let row_num = r + 1;
        out.push_str(&format!(r#"<row r="{row_num}">"#));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{row_num}", column_name(c));
            match cell {
                Cell::Number(v) if v.is_finite() => {
                    out.push_str(&format!(r#"<c r="{cell_ref}"><v>{v}</v></c>"#));
                }
                Cell::Number(_) => {
                    out.push_str(&format!(r#"<c r="{cell_ref}"/>"#));
                }
                Cell::Text(s) => {
                    out.push_str(&format!(
                        r#"<c r="{cell_ref}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                        escape(&xml_safe(s))
                    ));
                }
            }
        }
        out.push_str("</row>");
    }

    out.push_str("</sheetData></worksheet>");
    out
}

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Drop control characters XML 1.0 cannot carry.
fn xml_safe(s: &str) -> String {
    s.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(3), "D");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn sheet_escapes_text_and_strips_control_chars() {
        let xml = sheet_xml(
            &["text"],
            &[vec![Cell::Text("a<b & \u{1}c".to_string())]],
        );
        assert!(xml.contains("a&lt;b &amp; c"));
        assert!(!xml.contains('\u{1}'));
    }

    #[test]
    fn numbers_are_plain_values() {
        let xml = sheet_xml(&["timestamp"], &[vec![Cell::Number(12.5)], vec![Cell::Number(f64::NAN)]]);
        assert!(xml.contains(r#"<c r="A2"><v>12.5</v></c>"#));
        assert!(xml.contains(r#"<c r="A3"/>"#));
        assert!(xml.contains(r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">timestamp</t></is></c>"#));
    }
}
