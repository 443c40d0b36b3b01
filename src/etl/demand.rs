//! Demanda proyectada desde el anexo de datos de la UPME.

use crate::error::Result;
use crate::etl::{Extraction, Normalizer};
use crate::excel::bundle::{base_name, open_bundle};
use crate::excel::io::Workbook;
use crate::excel::layout::{DemandSheetKind, LayoutProfile};
use crate::excel::locator::{locate_demand_sheets, pick_demand_bundle_url, plan_demand_bundle, sector_file_sheet};
use crate::excel::tabular::{unpivot, TabularSheet};
use crate::fetch::{timeouts, SourceFetcher};
use crate::models::{DemandRecord, FactTable};
use crate::report::{SkipReason, TableReport};

pub const UPME_URL: &str = "https://www1.upme.gov.co/DemandayEficiencia/Paginas/Proyeccion_Demanda_Gas_Natural.aspx";
pub const UPME_BASE: &str = "https://www1.upme.gov.co";
pub const FALLBACK_BUNDLE_URL: &str =
    "https://docs.upme.gov.co/DemandayEficiencia/Documents/Anexo_Datos_Proyeccion_Demanda_Gas_Nat_2024.zip";

/// Lee una hoja con el perfil de su tipo y la normaliza.
fn parse_sheet(
    workbook: &mut Workbook,
    sheet: &str,
    kind: DemandSheetKind,
    sector_tag: Option<&str>,
    normalizer: &Normalizer,
    report: &mut TableReport,
) -> Vec<DemandRecord> {
    let grid = match workbook.grid(sheet) {
        Ok(g) => g,
        Err(e) => {
            report.skips.record(SkipReason::SheetUnreadable { sheet: sheet.to_string(), message: e.to_string() });
            return Vec::new();
        }
    };
    let LayoutProfile::Tabular(layout) = kind.profile() else {
        return Vec::new();
    };

    let unpivoted = match TabularSheet::from_grid(sheet, &grid, layout).and_then(|t| unpivot(&t, &mut report.skips)) {
        Ok(u) => u,
        Err(reason) => {
            report.skips.record(reason);
            return Vec::new();
        }
    };
    report.sheets_parsed += 1;
    let records = normalizer.demand(kind, sector_tag, &unpivoted.tuples, &mut report.skips);
    log::info!(
        "{} / {} ({}): {} filas × {} columnas → {} registros",
        workbook.name,
        sheet,
        kind.label(),
        unpivoted.date_rows,
        unpivoted.variable_columns,
        records.len()
    );
    records
}

/// Libro principal: hojas de escenarios, regional y sectorial.
pub fn parse_demand_workbook(
    name: &str,
    bytes: Vec<u8>,
    normalizer: &Normalizer,
    report: &mut TableReport,
) -> Vec<DemandRecord> {
    let mut workbook = match Workbook::from_bytes(name, bytes) {
        Ok(wb) => wb,
        Err(e) => {
            report.skips.record(SkipReason::WorkbookUnreadable { file: name.to_string(), message: e.to_string() });
            return Vec::new();
        }
    };
    report.files_seen += 1;

    let located = locate_demand_sheets(&workbook.sheet_names());
    for kind in [DemandSheetKind::Scenarios, DemandSheetKind::Regional, DemandSheetKind::Sectorial] {
        if !located.iter().any(|(k, _)| *k == kind) {
            report.skips.record(SkipReason::SheetNotFound { kind: kind.label() });
        }
    }

    let mut records = Vec::new();
    for (kind, sheet) in &located {
        records.extend(parse_sheet(&mut workbook, sheet, *kind, None, normalizer, report));
    }
    records
}

/// Archivo independiente de un sector: hoja regional (o la primera).
pub fn parse_sector_file(
    name: &str,
    bytes: Vec<u8>,
    sector: &str,
    normalizer: &Normalizer,
    report: &mut TableReport,
) -> Vec<DemandRecord> {
    let mut workbook = match Workbook::from_bytes(name, bytes) {
        Ok(wb) => wb,
        Err(e) => {
            report.skips.record(SkipReason::WorkbookUnreadable { file: name.to_string(), message: e.to_string() });
            return Vec::new();
        }
    };
    report.files_seen += 1;

    match sector_file_sheet(&workbook.sheet_names()) {
        Some(sheet) => parse_sheet(&mut workbook, &sheet, DemandSheetKind::SectorFile, Some(sector), normalizer, report),
        None => {
            report.skips.record(SkipReason::SheetNotFound { kind: DemandSheetKind::SectorFile.label() });
            Vec::new()
        }
    }
}

/// Paquete descargado (ZIP o libro suelto) → registros de demanda.
pub fn parse_demand_bundle(
    name: &str,
    bytes: Vec<u8>,
    normalizer: &Normalizer,
    report: &mut TableReport,
) -> Result<Vec<DemandRecord>> {
    let entries = open_bundle(name, bytes)?;
    let plan = plan_demand_bundle(&entries);

    let mut records = Vec::new();
    for entry in &plan.primary {
        log::info!("demanda: archivo principal {}", base_name(&entry.name));
        records.extend(parse_demand_workbook(&entry.name, entry.bytes.clone(), normalizer, report));
    }
    for (entry, sector) in &plan.sector_files {
        log::info!("demanda: archivo del sector {} ({})", sector, base_name(&entry.name));
        records.extend(parse_sector_file(&entry.name, entry.bytes.clone(), sector, normalizer, report));
    }
    Ok(records)
}

/// URL del paquete: el enlace del anexo en la página de la UPME o el respaldo.
pub fn discover_bundle_url(fetcher: &dyn SourceFetcher) -> String {
    match fetcher.list_links(UPME_URL, timeouts::DEMAND_INDEX) {
        Ok(links) => match pick_demand_bundle_url(&links, UPME_BASE) {
            Some(url) => {
                log::info!("demanda: anexo encontrado en {}", url);
                url
            }
            None => {
                log::warn!("demanda: sin enlace al anexo, usando {}", FALLBACK_BUNDLE_URL);
                FALLBACK_BUNDLE_URL.to_string()
            }
        },
        Err(e) => {
            log::warn!("demanda: página de la UPME no disponible ({}), usando {}", e, FALLBACK_BUNDLE_URL);
            FALLBACK_BUNDLE_URL.to_string()
        }
    }
}

pub fn extract_demand(fetcher: &dyn SourceFetcher, normalizer: &Normalizer) -> Extraction<DemandRecord> {
    let url = discover_bundle_url(fetcher);
    let bytes = match fetcher.fetch(&url, timeouts::DEMAND_BUNDLE) {
        Ok(b) => b,
        Err(e) => return Extraction::unavailable(FactTable::Demand, &url, e.to_string()),
    };

    let mut out = Extraction::new(FactTable::Demand);
    match parse_demand_bundle(base_name(&url), bytes, normalizer, &mut out.report) {
        Ok(records) => out.records = records,
        Err(e) => {
            out.report.skips.record(SkipReason::WorkbookUnreadable { file: url.clone(), message: e.to_string() });
        }
    }
    out.report.records_extracted = out.records.len();
    log::info!("demanda: {} registros", out.records.len());
    out
}
