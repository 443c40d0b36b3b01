use std::error::Error as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::models::FactTable;

/// Errores que interrumpen una fuente o la corrida completa.
///
/// Los problemas de estructura o de fila no son errores: se registran como
/// `SkipReason` en el reporte de la corrida.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("load of table {table} failed at batch {batch}")]
    Load {
        table: FactTable,
        batch: usize,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    pub fn fetch(url: &str, message: impl Into<String>) -> Self {
        EtlError::Fetch { url: url.to_string(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

/// Agrega al archivo de errores el error y su cadena de causas, una por línea.
pub fn append_error_log(path: &Path, err: &EtlError) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "[{}] {}", chrono::Utc::now().to_rfc3339(), err)?;
    let mut source = err.source();
    while let Some(cause) = source {
        writeln!(file, "  caused by: {}", cause)?;
        source = cause.source();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn load_failure() -> EtlError {
        EtlError::Load {
            table: FactTable::Demand,
            batch: 2,
            source: Box::new(EtlError::Config("disk full".to_string())),
        }
    }

    #[test]
    fn load_error_names_table_and_batch() {
        let err = load_failure();
        assert_eq!(err.to_string(), "load of table demand failed at batch 2");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("config: disk full"));
    }

    #[test]
    fn error_log_lists_each_cause_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        append_error_log(&path, &load_failure()).unwrap();
        append_error_log(&path, &EtlError::fetch("https://x.gov.co/a.zip", "timeout")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("disk full").count(), 1);
        assert!(text.contains("  caused by: config: disk full"));
        assert!(text.contains("fetch failed for https://x.gov.co/a.zip: timeout"));
        assert_eq!(text.lines().count(), 3);
    }
}
