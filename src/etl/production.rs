//! Producción desde las declaraciones publicadas por el Ministerio de Minas.

use crate::etl::{Extraction, Normalizer};
use crate::excel::bundle::open_bundle;
use crate::excel::io::Workbook;
use crate::excel::layout::LayoutProfile;
use crate::excel::locator::locate_production_files;
use crate::excel::pivot::{recover_sheet, ProductionTuple};
use crate::fetch::{timeouts, SourceFetcher};
use crate::models::{FactTable, ProductionRecord};
use crate::report::{SkipReason, TableReport};

pub const MINENERGIA_URL: &str =
    "https://www.minenergia.gov.co/es/misional/hidrocarburos/funcionamiento-del-sector/gas-natural/";
pub const BASE_URL: &str = "https://www.minenergia.gov.co";

/// Límites y perfil de la extracción de producción.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionLimits {
    /// Archivos a procesar; 0 no acota.
    pub file_limit: usize,
    /// Hojas por libro.
    pub sheet_limit: usize,
    /// Disposición de las hojas de las declaraciones.
    pub profile: LayoutProfile,
}

impl Default for ProductionLimits {
    fn default() -> Self {
        ProductionLimits { file_limit: 10, sheet_limit: 20, profile: LayoutProfile::PRODUCTION }
    }
}

/// Recupera las tuplas de todas las hojas de un libro (hasta `sheet_limit`).
/// Sólo los perfiles pivoteados aplican a las declaraciones.
pub fn parse_production_workbook(
    name: &str,
    bytes: Vec<u8>,
    profile: &LayoutProfile,
    sheet_limit: usize,
    report: &mut TableReport,
) -> Vec<ProductionTuple> {
    let Some(layout) = profile.pivot() else {
        report.skips.record(SkipReason::LayoutMismatch { file: name.to_string(), layout: profile.label() });
        return Vec::new();
    };
    let mut workbook = match Workbook::from_bytes(name, bytes) {
        Ok(wb) => wb,
        Err(e) => {
            report.skips.record(SkipReason::WorkbookUnreadable { file: name.to_string(), message: e.to_string() });
            return Vec::new();
        }
    };

    let sheets = workbook.sheet_names();
    if sheets.len() > sheet_limit {
        report.skips.record(SkipReason::SheetCapReached { file: name.to_string(), skipped: sheets.len() - sheet_limit });
    }

    let mut tuples = Vec::new();
    for sheet in sheets.iter().take(sheet_limit) {
        let grid = match workbook.grid(sheet) {
            Ok(g) => g,
            Err(e) => {
                report.skips.record(SkipReason::SheetUnreadable { sheet: sheet.clone(), message: e.to_string() });
                continue;
            }
        };
        let found = recover_sheet(sheet, &grid, layout, &mut report.skips);
        report.sheets_parsed += 1;
        log::debug!("{} / {}: {} tuplas", name, sheet, found.len());
        tuples.extend(found);
    }
    tuples
}

pub fn extract_production(
    fetcher: &dyn SourceFetcher,
    normalizer: &Normalizer,
    limits: ProductionLimits,
) -> Extraction<ProductionRecord> {
    let mut out = Extraction::new(FactTable::Production);
    let links = match fetcher.list_links(MINENERGIA_URL, timeouts::PRODUCTION_INDEX) {
        Ok(l) => l,
        Err(e) => return Extraction::unavailable(FactTable::Production, MINENERGIA_URL, e.to_string()),
    };

    let candidates = locate_production_files(&links, BASE_URL, limits.file_limit);
    if candidates.is_empty() {
        log::warn!("producción: no se encontraron archivos en {}", MINENERGIA_URL);
    }

    let mut tuples = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        log::info!("producción [{}/{}]: {} ({})", i + 1, candidates.len(), candidate.label, candidate.period);
        let bytes = match fetcher.fetch(&candidate.url, timeouts::PRODUCTION_FILE) {
            Ok(b) => b,
            Err(e) => {
                out.report
                    .skips
                    .record(SkipReason::SourceUnavailable { url: candidate.url.clone(), message: e.to_string() });
                continue;
            }
        };
        let entries = match open_bundle(&candidate.url, bytes) {
            Ok(entries) => entries,
            Err(e) => {
                out.report
                    .skips
                    .record(SkipReason::WorkbookUnreadable { file: candidate.url.clone(), message: e.to_string() });
                continue;
            }
        };
        for entry in entries {
            out.report.files_seen += 1;
            tuples.extend(parse_production_workbook(
                &entry.name,
                entry.bytes,
                &limits.profile,
                limits.sheet_limit,
                &mut out.report,
            ));
        }
    }

    out.records = normalizer.production(tuples, &mut out.report.skips);
    out.report.records_extracted = out.records.len();
    log::info!("producción: {} registros válidos", out.records.len());
    out
}
