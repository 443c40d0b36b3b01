use std::io::{Cursor, Read};

use crate::error::Result;

/// Archivo de Excel extraído de un paquete descargado.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Extensiones aceptadas como libro de Excel.
pub fn is_excel_name(name: &str) -> bool {
    let low = name.to_lowercase();
    low.ends_with(".xlsx") || low.ends_with(".xlsm") || low.ends_with(".xls")
}

/// Nombre de archivo sin directorios del ZIP.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Abre lo descargado: un ZIP con libros adentro se expande a sus miembros de
/// Excel; cualquier otra cosa (un xlsx también es un ZIP) se trata como un
/// único libro.
pub fn open_bundle(name: &str, bytes: Vec<u8>) -> Result<Vec<BundleEntry>> {
    if !bytes.starts_with(b"PK") {
        return Ok(vec![BundleEntry { name: name.to_string(), bytes }]);
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice()))?;
    let is_workbook = archive.file_names().any(|n| n == "[Content_Types].xml");
    if is_workbook {
        drop(archive);
        return Ok(vec![BundleEntry { name: name.to_string(), bytes }]);
    }

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() || !is_excel_name(file.name()) {
            continue;
        }
        // archivos temporales de Excel (~$libro.xlsx) y metadatos de macOS
        let file_name = base_name(file.name()).to_string();
        if file_name.starts_with("~$") || file.name().starts_with("__MACOSX") {
            continue;
        }
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        entries.push(BundleEntry { name: file.name().to_string(), bytes: buf });
    }
    log::info!("{}: {} libros de Excel en el paquete", name, entries.len());
    Ok(entries)
}
