//! Extracción por fuente y orquestación de la corrida.
//!
//! - `normalizer`: tuplas → registros tipados
//! - `royalties`, `production`, `demand`: una fuente cada uno
//! - `pipeline`: orden de las fuentes y carga al almacén

pub mod demand;
pub mod normalizer;
pub mod pipeline;
pub mod production;
pub mod royalties;

use crate::models::FactTable;
use crate::report::{SkipReason, TableReport};

pub use normalizer::Normalizer;
pub use pipeline::{run_pipeline, PipelineOptions};

/// Registros extraídos de una fuente junto con su reporte.
#[derive(Debug)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    pub report: TableReport,
}

impl<R> Extraction<R> {
    pub fn new(table: FactTable) -> Self {
        Extraction { records: Vec::new(), report: TableReport::new(table) }
    }

    /// Fuente caída: sin registros, la tabla no se toca.
    pub fn unavailable(table: FactTable, url: &str, message: impl Into<String>) -> Self {
        let mut out = Extraction::new(table);
        out.report.skips.record(SkipReason::SourceUnavailable { url: url.to_string(), message: message.into() });
        out
    }
}
