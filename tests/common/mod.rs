// Helpers compartidos por los tests de integración: libros xlsx mínimos
// armados en memoria, paquetes ZIP y fuentes/almacenes de prueba.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::time::Duration;

use simgn::error::{EtlError, Result};
use simgn::fetch::SourceFetcher;
use simgn::models::{FactTable, SourceLink};
use simgn::store::{FactStore, SqlValue};
use zip::write::FileOptions;

#[derive(Debug, Clone)]
pub enum Cell {
    S(&'static str),
    N(f64),
    Blank,
}

pub use Cell::{Blank, N, S};

fn col_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut body = String::new();
    for (r, row) in rows.iter().enumerate() {
        let mut cells = String::new();
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", col_name(c), r + 1);
            match cell {
                Cell::S(s) => cells.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference,
                    escape(s)
                )),
                Cell::N(n) => cells.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n)),
                Cell::Blank => {}
            }
        }
        if !cells.is_empty() {
            body.push_str(&format!(r#"<row r="{}">{}</row>"#, r + 1, cells));
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        body
    )
}

/// Libro xlsx mínimo con las hojas dadas (texto en línea, sin estilos).
pub fn xlsx(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Vec<u8> {
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    let mut workbook_sheets = String::new();
    let mut rels = String::new();
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        ));
        workbook_sheets.push_str(&format!(r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#, escape(name), n, n));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, n
        ));
    }
    content_types.push_str("</Types>");

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
        workbook_sheets
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        rels
    );
    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    let mut files: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".to_string(), content_types.into_bytes()),
        ("_rels/.rels".to_string(), root_rels.as_bytes().to_vec()),
        ("xl/workbook.xml".to_string(), workbook.into_bytes()),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels.into_bytes()),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        files.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(rows).into_bytes()));
    }
    let refs: Vec<(&str, &[u8])> = files.iter().map(|(n, b)| (n.as_str(), b.as_slice())).collect();
    zip_of(&refs)
}

pub fn zip_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        w.start_file(*name, FileOptions::default()).unwrap();
        w.write_all(data).unwrap();
    }
    w.finish().unwrap().into_inner()
}

/// Fuente en memoria: URL → bytes y página → enlaces.
#[derive(Default)]
pub struct StaticFetcher {
    pub files: HashMap<String, Vec<u8>>,
    pub pages: HashMap<String, Vec<SourceLink>>,
}

impl SourceFetcher for StaticFetcher {
    fn list_links(&self, page_url: &str, _: Duration) -> Result<Vec<SourceLink>> {
        self.pages.get(page_url).cloned().ok_or_else(|| EtlError::fetch(page_url, "no such page"))
    }

    fn fetch(&self, url: &str, _: Duration) -> Result<Vec<u8>> {
        self.files.get(url).cloned().ok_or_else(|| EtlError::fetch(url, "no such file"))
    }
}

/// Almacén que falla en el lote `fail_at` y registra los lotes confirmados.
pub struct FailingStore {
    pub fail_at: usize,
    pub committed: Vec<usize>,
    pub calls: usize,
}

impl FactStore for FailingStore {
    fn write_batch(&mut self, table: FactTable, _: &[&str], rows: &[Vec<SqlValue>], _: bool) -> Result<()> {
        let batch = self.calls;
        self.calls += 1;
        if batch == self.fail_at {
            return Err(EtlError::Config(format!("{} rejected batch {}", table, batch)));
        }
        self.committed.push(rows.len());
        Ok(())
    }
}
