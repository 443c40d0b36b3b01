use std::env;
use std::path::PathBuf;

use crate::error::{EtlError, Result};

/// Configuración de una corrida. Se lee de variables de entorno (y de `.env`
/// si existe); las banderas de la CLI pisan estos valores.
#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
    /// `SIMGN_DB_URL`: `sqlite://`, `file://`, `postgres://` o `postgresql://`.
    pub db_url: Option<String>,
    /// `SIMGN_DB_PATH`: archivo SQLite cuando no hay URL.
    pub db_path: PathBuf,
    /// `SIMGN_MIRROR_DIR`: raíz del espejo local de las fuentes.
    pub mirror_dir: PathBuf,
    /// `SIMGN_PRODUCTION_FILE_LIMIT`; 0 no acota.
    pub production_file_limit: usize,
    /// `SIMGN_PRODUCTION_SHEET_LIMIT`: hojas por libro de producción.
    pub production_sheet_limit: usize,
    /// `SIMGN_ERROR_LOG`: archivo donde se vuelca el error que aborta la corrida.
    pub error_log: PathBuf,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            db_url: None,
            db_path: PathBuf::from("data/simgn.db"),
            mirror_dir: PathBuf::from("mirror"),
            production_file_limit: 10,
            production_sheet_limit: 20,
            error_log: PathBuf::from("error.log"),
        }
    }
}

// load .env if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

fn parse_limit(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| EtlError::Config(format!("{} must be a non-negative integer, got '{}'", name, raw)))
}

impl EtlConfig {
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EtlConfig::default();
        if let Some(url) = lookup("SIMGN_DB_URL").filter(|s| !s.trim().is_empty()) {
            config.db_url = Some(url);
        }
        if let Some(p) = lookup("SIMGN_DB_PATH") {
            config.db_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("SIMGN_MIRROR_DIR") {
            config.mirror_dir = PathBuf::from(p);
        }
        if let Some(v) = lookup("SIMGN_PRODUCTION_FILE_LIMIT") {
            config.production_file_limit = parse_limit("SIMGN_PRODUCTION_FILE_LIMIT", &v)?;
        }
        if let Some(v) = lookup("SIMGN_PRODUCTION_SHEET_LIMIT") {
            config.production_sheet_limit = parse_limit("SIMGN_PRODUCTION_SHEET_LIMIT", &v)?;
        }
        if let Some(p) = lookup("SIMGN_ERROR_LOG") {
            config.error_log = PathBuf::from(p);
        }
        Ok(config)
    }
}
