// Biblioteca raíz del crate `simgn`.
// ETL de regalías, producción y demanda de gas natural: de hojas de cálculo y
// del API de datos abiertos a tablas de hechos.
pub mod config;
pub mod error;
pub mod etl;
pub mod excel;
pub mod fetch;
pub mod geo;
pub mod models;
pub mod report;
pub mod store;

pub use config::EtlConfig;
pub use error::{EtlError, Result};
pub use etl::{run_pipeline, PipelineOptions};
pub use fetch::{MirrorFetcher, SourceFetcher};
pub use models::FactTable;
pub use report::RunReport;
