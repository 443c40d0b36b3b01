//! Forma B: hojas pivoteadas con metadatos (declaraciones de producción).
//!
//! La estructura no está en una posición fija: se busca la fila de años por
//! contenido, la fila de meses va debajo, y cada columna con (año, mes)
//! reconocidos aporta una tupla por fila de datos con operadora.

use calamine::Data;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::excel::io::{cell_to_f64, cell_to_string, is_blank, Grid};
use crate::excel::layout::PivotLayout;
use crate::report::{SkipLog, SkipReason};

/// Abreviaturas de mes en español, en orden de búsqueda.
pub const MONTH_ABBREVIATIONS: [(&str, u32); 12] = [
    ("ene", 1),
    ("feb", 2),
    ("mar", 3),
    ("abr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dic", 12),
];

/// Tupla de producción recuperada de una hoja.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionTuple {
    /// Fila de la hoja (base 0) de donde sale el valor.
    pub row: usize,
    pub field: String,
    pub operator: String,
    pub year: i32,
    pub month: u32,
    pub volume: f64,
}

/// Mes de una etiqueta ("Ene", "ENERO", "sep-23"); sin distinguir mayúsculas.
pub fn month_from_label(label: &str) -> Option<u32> {
    let low = label.to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| low.contains(abbr))
        .map(|(_, m)| *m)
}

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"20\d{2}").expect("valid regex"));

/// Primer token de cuatro dígitos que empieza por "20".
pub fn find_year_token(text: &str) -> Option<i32> {
    YEAR_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Campo a partir del nombre de la hoja: texto antes del primer '_'.
pub fn field_from_sheet_name(sheet: &str) -> String {
    sheet.split('_').next().unwrap_or(sheet).trim().to_string()
}

/// Año vigente por columna. Un año aplica a las columnas siguientes hasta que
/// aparece otro (celdas combinadas en el origen).
pub fn years_by_column(year_row: &[Data]) -> Vec<Option<i32>> {
    let mut current = None;
    year_row
        .iter()
        .map(|c| {
            if let Some(y) = find_year_token(&cell_to_string(c)) {
                current = Some(y);
            }
            current
        })
        .collect()
}

/// columna → (año, mes); sólo entran columnas con ambos.
pub fn build_column_map(year_row: &[Data], month_row: &[Data]) -> BTreeMap<usize, (i32, u32)> {
    let width = year_row.len().max(month_row.len());
    let mut padded = year_row.to_vec();
    padded.resize(width, Data::Empty);
    let years = years_by_column(&padded);

    let mut map = BTreeMap::new();
    for (col, year) in years.into_iter().enumerate() {
        let month = month_row.get(col).and_then(|c| month_from_label(&cell_to_string(c)));
        if let (Some(y), Some(m)) = (year, month) {
            map.insert(col, (y, m));
        }
    }
    map
}

enum RecoveryState {
    SeekingYearRow,
    SeekingMonthRow { year_row: usize },
    EmittingTuples { columns: BTreeMap<usize, (i32, u32)>, row: usize },
    Done,
}

/// Recupera las tuplas de una hoja pivoteada. Una hoja sin fila de años dentro
/// del presupuesto de filas queda vacía.
pub fn recover_sheet(sheet_name: &str, grid: &Grid, layout: &PivotLayout, skips: &mut SkipLog) -> Vec<ProductionTuple> {
    let field = field_from_sheet_name(sheet_name);
    let mut tuples = Vec::new();
    let mut state = RecoveryState::SeekingYearRow;

    loop {
        state = match state {
            RecoveryState::SeekingYearRow => {
                let found = grid.iter().take(layout.row_scan_budget).position(|row| {
                    row.iter().any(|c| cell_to_string(c).to_lowercase().contains(layout.year_marker))
                });
                match found {
                    Some(year_row) => RecoveryState::SeekingMonthRow { year_row },
                    None => {
                        skips.record(SkipReason::YearRowNotFound { sheet: sheet_name.to_string() });
                        RecoveryState::Done
                    }
                }
            }
            RecoveryState::SeekingMonthRow { year_row } => {
                let month_row = year_row + layout.month_row_gap;
                match grid.get(month_row) {
                    Some(months) => RecoveryState::EmittingTuples {
                        columns: build_column_map(&grid[year_row], months),
                        row: month_row + 1,
                    },
                    None => {
                        skips.record(SkipReason::MonthRowMissing { sheet: sheet_name.to_string() });
                        RecoveryState::Done
                    }
                }
            }
            RecoveryState::EmittingTuples { columns, row } => match grid.get(row) {
                Some(cells) => {
                    emit_row(&field, sheet_name, row, cells, &columns, layout, &mut tuples, skips);
                    RecoveryState::EmittingTuples { columns, row: row + 1 }
                }
                None => RecoveryState::Done,
            },
            RecoveryState::Done => break,
        };
    }
    tuples
}

#[allow(clippy::too_many_arguments)]
fn emit_row(
    field: &str,
    sheet_name: &str,
    row_idx: usize,
    cells: &[Data],
    columns: &BTreeMap<usize, (i32, u32)>,
    layout: &PivotLayout,
    out: &mut Vec<ProductionTuple>,
    skips: &mut SkipLog,
) {
    let operator = match cells.get(layout.operator_column) {
        Some(c) if !is_blank(c) => cell_to_string(c),
        _ => {
            skips.record(SkipReason::EmptyOperator { sheet: sheet_name.to_string(), row: row_idx });
            return;
        }
    };

    for (&col, &(year, month)) in columns {
        let column = format!("{}-{:02}", year, month);
        let cell = match cells.get(col) {
            Some(c) if !is_blank(c) => c,
            _ => {
                skips.record(SkipReason::EmptyValue { row: row_idx, column });
                continue;
            }
        };
        match cell_to_f64(cell) {
            Some(v) if v > 0.0 => out.push(ProductionTuple {
                row: row_idx,
                field: field.to_string(),
                operator: operator.clone(),
                year,
                month,
                volume: v,
            }),
            Some(_) => skips.record(SkipReason::NonPositive { row: row_idx, column }),
            None => skips.record(SkipReason::NonNumeric { row: row_idx, column }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn month_table_is_total_and_case_insensitive() {
        let labels = ["Ene", "FEB", "mar", "Abril", "MAYO", "jun", "Julio", "ago", "Sep", "oct", "NOV", "Dic"];
        for (i, l) in labels.iter().enumerate() {
            assert_eq!(month_from_label(l), Some(i as u32 + 1), "{}", l);
        }
        assert_eq!(month_from_label("Total"), None);
        assert_eq!(month_from_label(""), None);
    }

    #[test]
    fn year_tokens() {
        assert_eq!(find_year_token("Año 2023"), Some(2023));
        assert_eq!(find_year_token("2024"), Some(2024));
        assert_eq!(find_year_token("1999"), None);
        assert_eq!(find_year_token("año"), None);
    }

    #[test]
    fn year_carries_forward_over_merged_cells() {
        let row = vec![s("2023"), s(""), s(""), s("2024"), s("")];
        assert_eq!(
            years_by_column(&row),
            vec![Some(2023), Some(2023), Some(2023), Some(2024), Some(2024)]
        );
    }

    #[test]
    fn unknown_month_tokens_stay_out_of_map() {
        let years = vec![s("2023"), Data::Empty, Data::Empty];
        let months = vec![s("Ene"), s("Total"), s("Feb")];
        let map = build_column_map(&years, &months);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&0), Some(&(2023, 1)));
        assert!(map.get(&1).is_none());
        assert_eq!(map.get(&2), Some(&(2023, 2)));
    }

    #[test]
    fn columns_before_first_year_are_unmapped() {
        let years = vec![s("Año"), Data::Empty, s("2022")];
        let months = vec![s("Ene"), s("Feb"), s("Mar")];
        let map = build_column_map(&years, &months);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn field_is_prefix_before_underscore() {
        assert_eq!(field_from_sheet_name("CUSIANA_Norte"), "CUSIANA");
        assert_eq!(field_from_sheet_name("CHUCHUPA"), "CHUCHUPA");
        assert_eq!(field_from_sheet_name("LA_CRECIENTE_A"), "LA");
    }

    #[test]
    fn recovers_single_positive_cell() {
        let grid: Grid = vec![
            vec![s("Declaración de producción")],
            vec![s("Año"), s(""), s(""), s("2023"), s("")],
            vec![s(""), s(""), s(""), s("Ene"), s("Feb")],
            vec![s(""), s(""), s("EcoPetrol"), Data::Float(500.0), Data::Float(0.0)],
        ];
        let mut skips = SkipLog::new();
        let tuples = recover_sheet("CUSIANA_Norte", &grid, &PivotLayout::MINENERGIA, &mut skips);
        assert_eq!(
            tuples,
            vec![ProductionTuple {
                row: 3,
                field: "CUSIANA".into(),
                operator: "EcoPetrol".into(),
                year: 2023,
                month: 1,
                volume: 500.0,
            }]
        );
        assert_eq!(skips.count("non_positive"), 1);
    }

    #[test]
    fn rows_without_operator_are_skipped() {
        let grid: Grid = vec![
            vec![s("AÑO"), s("2023"), s("")],
            vec![s(""), s("ene"), s("feb")],
            vec![s(""), Data::Float(1.0), Data::Float(2.0)],
            vec![s("x"), Data::Float(1.0), Data::Float(2.0), s("nan")],
        ];
        let layout = PivotLayout { operator_column: 3, ..PivotLayout::MINENERGIA };
        let mut skips = SkipLog::new();
        let tuples = recover_sheet("F", &grid, &layout, &mut skips);
        assert!(tuples.is_empty());
        assert_eq!(skips.count("empty_operator"), 2);
    }

    #[test]
    fn out_of_range_date_cell_does_not_abort_scan() {
        let huge = Data::DateTime(ExcelDateTime::new(1e15, ExcelDateTimeType::DateTime, false));
        let grid: Grid = vec![
            vec![huge.clone(), s("Año"), s("2023")],
            vec![s(""), huge, s("Ene")],
            vec![s(""), s(""), s("Op")],
        ];
        let layout = PivotLayout { operator_column: 2, ..PivotLayout::MINENERGIA };
        let mut skips = SkipLog::new();
        let tuples = recover_sheet("F", &grid, &layout, &mut skips);
        assert!(tuples.is_empty());
        assert_eq!(skips.count("year_row_not_found"), 0);
    }

    #[test]
    fn year_row_beyond_budget_abandons_sheet() {
        let mut grid: Grid = vec![vec![s("metadata")]; 15];
        grid.push(vec![s("Año"), s("2023")]);
        grid.push(vec![s(""), s("Ene")]);
        grid.push(vec![s(""), s("Op"), Data::Float(3.0)]);
        let mut skips = SkipLog::new();
        assert!(recover_sheet("F", &grid, &PivotLayout::MINENERGIA, &mut skips).is_empty());
        assert_eq!(skips.count("year_row_not_found"), 1);
    }
}
