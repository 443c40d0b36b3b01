//! Tuplas largas → registros tipados de las tablas de hechos.

use chrono::{DateTime, Datelike, Utc};

use crate::excel::layout::DemandSheetKind;
use crate::excel::pivot::ProductionTuple;
use crate::excel::tabular::LongTuple;
use crate::models::{
    valid_period, DemandRecord, ProductionRecord, Scenario, REGION_NATIONAL, SECTOR_AGGREGATE, SECTOR_UNKNOWN,
};
use crate::report::{SkipLog, SkipReason};

/// Largo máximo de los campos de texto persistidos.
pub const MAX_TEXT_LEN: usize = 100;

pub fn truncate_text(s: &str) -> String {
    s.trim().chars().take(MAX_TEXT_LEN).collect()
}

/// Normalizador de una corrida. Todos los registros que produce comparten el
/// mismo `load_timestamp`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    load_timestamp: DateTime<Utc>,
}

impl Normalizer {
    pub fn new(load_timestamp: DateTime<Utc>) -> Self {
        Normalizer { load_timestamp }
    }

    pub fn load_timestamp(&self) -> DateTime<Utc> {
        self.load_timestamp
    }

    /// Etiqueta las tuplas de una hoja de demanda según su tipo.
    ///
    /// `sector_tag` es el sector declarado de la hoja de escenarios (por
    /// defecto "Aggregate") o la etiqueta del archivo por sector.
    pub fn demand(
        &self,
        kind: DemandSheetKind,
        sector_tag: Option<&str>,
        tuples: &[LongTuple],
        skips: &mut SkipLog,
    ) -> Vec<DemandRecord> {
        let mut out = Vec::with_capacity(tuples.len());
        for t in tuples {
            let (year, month) = (t.date.year(), t.date.month());
            if !valid_period(year, month) {
                skips.record(SkipReason::PeriodOutOfRange { year, month });
                continue;
            }
            let variable = t.variable.trim();
            let (sector, region, scenario) = match kind {
                DemandSheetKind::Scenarios => (
                    sector_tag.unwrap_or(SECTOR_AGGREGATE).to_string(),
                    REGION_NATIONAL.to_string(),
                    Scenario::from_variable(variable),
                ),
                DemandSheetKind::Regional => {
                    if variable.eq_ignore_ascii_case("nacional") {
                        skips.record(SkipReason::NationalInRegional);
                        continue;
                    }
                    (SECTOR_AGGREGATE.to_string(), truncate_text(variable), Scenario::Medium)
                }
                DemandSheetKind::Sectorial => {
                    (truncate_text(variable), REGION_NATIONAL.to_string(), Scenario::Medium)
                }
                DemandSheetKind::SectorFile => {
                    if t.value <= 0.0 {
                        skips.record(SkipReason::NonPositive { row: t.row, column: t.variable.clone() });
                        continue;
                    }
                    if variable.eq_ignore_ascii_case("nacional") {
                        skips.record(SkipReason::NationalInRegional);
                        continue;
                    }
                    (
                        sector_tag.unwrap_or(SECTOR_UNKNOWN).to_string(),
                        truncate_text(variable),
                        Scenario::Medium,
                    )
                }
            };
            out.push(DemandRecord {
                sector,
                region,
                year,
                month,
                scenario,
                demand_value: t.value,
                load_timestamp: self.load_timestamp,
            });
        }
        out
    }

    /// Tuplas de producción → registros. Sólo pasan volúmenes positivos de
    /// campos identificados.
    pub fn production(&self, tuples: Vec<ProductionTuple>, skips: &mut SkipLog) -> Vec<ProductionRecord> {
        let mut out = Vec::with_capacity(tuples.len());
        for t in tuples {
            let field = truncate_text(&t.field);
            if field.is_empty() || field == SECTOR_UNKNOWN {
                skips.record(SkipReason::UnknownField);
                continue;
            }
            if t.volume.is_nan() || t.volume <= 0.0 {
                skips.record(SkipReason::NonPositive { row: t.row, column: format!("{}-{:02}", t.year, t.month) });
                continue;
            }
            if !valid_period(t.year, t.month) {
                skips.record(SkipReason::PeriodOutOfRange { year: t.year, month: t.month });
                continue;
            }
            out.push(ProductionRecord {
                field,
                operator: truncate_text(&t.operator),
                department: String::new(),
                municipality: String::new(),
                year: t.year,
                month: t.month,
                monthly_volume: t.volume,
                load_timestamp: self.load_timestamp,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn tuple(variable: &str, value: f64) -> LongTuple {
        LongTuple {
            row: 2,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            variable: variable.to_string(),
            value,
        }
    }

    #[test]
    fn scenario_sheet_labels() {
        let n = Normalizer::new(ts());
        let tuples = vec![tuple("Bajo", 100.0), tuple("Medio", 120.0), tuple("Alto", 140.0)];
        let recs = n.demand(DemandSheetKind::Scenarios, None, &tuples, &mut SkipLog::new());
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.sector == "Aggregate" && r.region == "Nacional"));
        assert_eq!(recs[0].scenario, Scenario::Low);
        assert_eq!(recs[1].scenario, Scenario::Medium);
        assert_eq!(recs[2].scenario, Scenario::High);
        assert!(recs.iter().all(|r| r.load_timestamp == ts()));
    }

    #[test]
    fn regional_never_emits_national() {
        let n = Normalizer::new(ts());
        let tuples = vec![tuple("Costa", 10.0), tuple("NACIONAL", 99.0), tuple(" Nacional ", 98.0), tuple("Centro", 5.0)];
        let mut skips = SkipLog::new();
        let recs = n.demand(DemandSheetKind::Regional, None, &tuples, &mut skips);
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.region != "Nacional"));
        assert!(recs.iter().all(|r| r.scenario == Scenario::Medium && r.sector == "Aggregate"));
        assert_eq!(skips.count("national_in_regional"), 2);
    }

    #[test]
    fn sectorial_and_sector_file() {
        let n = Normalizer::new(ts());
        let recs = n.demand(DemandSheetKind::Sectorial, None, &[tuple("Industrial", 3.0)], &mut SkipLog::new());
        assert_eq!((recs[0].sector.as_str(), recs[0].region.as_str()), ("Industrial", "Nacional"));

        let mut skips = SkipLog::new();
        let recs = n.demand(
            DemandSheetKind::SectorFile,
            Some("Residential"),
            &[tuple("Costa", 4.0), tuple("Centro", 0.0)],
            &mut skips,
        );
        assert_eq!(recs.len(), 1);
        assert_eq!((recs[0].sector.as_str(), recs[0].region.as_str()), ("Residential", "Costa"));
        assert_eq!(skips.count("non_positive"), 1);
    }

    #[test]
    fn production_filters() {
        let n = Normalizer::new(ts());
        let t = |field: &str, volume: f64| ProductionTuple {
            row: 7,
            field: field.to_string(),
            operator: "Op".to_string(),
            year: 2023,
            month: 1,
            volume,
        };
        let long = "X".repeat(150);
        let mut skips = SkipLog::new();
        let recs = n.production(
            vec![t("CUSIANA", 500.0), t("Unknown", 1.0), t("CUPIAGUA", 0.0), t(&long, 2.0)],
            &mut skips,
        );
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.monthly_volume > 0.0 && r.field != "Unknown"));
        assert_eq!(recs[1].field.chars().count(), MAX_TEXT_LEN);
        assert_eq!(skips.count("unknown_field"), 1);
        assert_eq!(skips.count("non_positive"), 1);
        assert_eq!(skips.samples[1], "row 7 column '2023-01': not positive");
    }
}
