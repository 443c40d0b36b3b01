//! Corrida completa: regalías, producción y demanda, en ese orden.

use chrono::{DateTime, Utc};

use crate::config::EtlConfig;
use crate::error::Result;
use crate::etl::demand::extract_demand;
use crate::etl::production::{extract_production, ProductionLimits};
use crate::etl::royalties::extract_royalties;
use crate::etl::{Extraction, Normalizer};
use crate::fetch::SourceFetcher;
use crate::models::FactTable;
use crate::report::{RunReport, TableReport};
use crate::store::{replace_table, FactRow, FactStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Corre sólo esta tabla.
    pub only: Option<FactTable>,
    pub production: ProductionLimits,
}

impl PipelineOptions {
    pub fn from_config(config: &EtlConfig) -> Self {
        PipelineOptions {
            only: None,
            production: ProductionLimits {
                file_limit: config.production_file_limit,
                sheet_limit: config.production_sheet_limit,
                ..ProductionLimits::default()
            },
        }
    }

    fn includes(&self, table: FactTable) -> bool {
        self.only.is_none_or(|t| t == table)
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions { only: None, production: ProductionLimits::default() }
    }
}

/// Carga lo extraído. Sin registros la tabla queda intacta.
fn load<S, R>(store: &mut S, extraction: Extraction<R>) -> Result<TableReport>
where
    S: FactStore + ?Sized,
    R: FactRow,
{
    let Extraction { records, mut report } = extraction;
    if records.is_empty() {
        log::warn!("{}: sin registros, la tabla no se modifica", report.table);
        return Ok(report);
    }
    report.records_loaded = replace_table(store, &records)?;
    report.loaded = true;
    log::info!("{}: {} registros cargados", report.table, report.records_loaded);
    Ok(report)
}

/// Ejecuta las fuentes en orden. Una fuente caída se registra y se sigue con
/// la próxima; un error de carga corta la corrida y se devuelve.
pub fn run_pipeline<S>(fetcher: &dyn SourceFetcher, store: &mut S, options: &PipelineOptions) -> Result<RunReport>
where
    S: FactStore + ?Sized,
{
    run_pipeline_at(fetcher, store, options, Utc::now())
}

/// Igual que `run_pipeline` con la hora de carga fijada por el llamador.
pub fn run_pipeline_at<S>(
    fetcher: &dyn SourceFetcher,
    store: &mut S,
    options: &PipelineOptions,
    load_timestamp: DateTime<Utc>,
) -> Result<RunReport>
where
    S: FactStore + ?Sized,
{
    let normalizer = Normalizer::new(load_timestamp);
    let mut report = RunReport::start(load_timestamp);

    if options.includes(FactTable::Royalties) {
        log::info!("=== regalías ===");
        let extraction = extract_royalties(fetcher, &normalizer);
        report.tables.push(load(store, extraction)?);
    }
    if options.includes(FactTable::Production) {
        log::info!("=== producción ===");
        let extraction = extract_production(fetcher, &normalizer, options.production);
        report.tables.push(load(store, extraction)?);
    }
    if options.includes(FactTable::Demand) {
        log::info!("=== demanda ===");
        let extraction = extract_demand(fetcher, &normalizer);
        report.tables.push(load(store, extraction)?);
    }

    report.finished_at = Some(Utc::now());
    for t in &report.tables {
        log::info!(
            "resumen {}: {} cargados, {} descartes{}",
            t.table,
            t.records_loaded,
            t.skips.total(),
            if t.loaded { "" } else { " (tabla sin cambios)" }
        );
    }
    Ok(report)
}
