//! Reporte de corrida: qué se cargó y por qué se descartó lo demás.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::FactTable;

/// Motivo por el que una fuente, hoja, fila o celda no produjo registros.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    SourceUnavailable { url: String, message: String },
    WorkbookUnreadable { file: String, message: String },
    SheetUnreadable { sheet: String, message: String },
    SheetNotFound { kind: &'static str },
    SheetCapReached { file: String, skipped: usize },
    LayoutMismatch { file: String, layout: &'static str },
    HeaderRowMissing { sheet: String, offset: usize },
    DateColumnNotFound { sheet: String },
    YearRowNotFound { sheet: String },
    MonthRowMissing { sheet: String },
    EmptyOperator { sheet: String, row: usize },
    InvalidDate { row: usize },
    EmptyValue { row: usize, column: String },
    NonNumeric { row: usize, column: String },
    NonPositive { row: usize, column: String },
    PeriodOutOfRange { year: i32, month: u32 },
    UnknownField,
    NationalInRegional,
    MalformedRow { message: String },
}

impl SkipReason {
    /// Clave estable para agregar conteos.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::SourceUnavailable { .. } => "source_unavailable",
            SkipReason::WorkbookUnreadable { .. } => "workbook_unreadable",
            SkipReason::SheetUnreadable { .. } => "sheet_unreadable",
            SkipReason::SheetNotFound { .. } => "sheet_not_found",
            SkipReason::SheetCapReached { .. } => "sheet_cap_reached",
            SkipReason::LayoutMismatch { .. } => "layout_mismatch",
            SkipReason::HeaderRowMissing { .. } => "header_row_missing",
            SkipReason::DateColumnNotFound { .. } => "date_column_not_found",
            SkipReason::YearRowNotFound { .. } => "year_row_not_found",
            SkipReason::MonthRowMissing { .. } => "month_row_missing",
            SkipReason::EmptyOperator { .. } => "empty_operator",
            SkipReason::InvalidDate { .. } => "invalid_date",
            SkipReason::EmptyValue { .. } => "empty_value",
            SkipReason::NonNumeric { .. } => "non_numeric",
            SkipReason::NonPositive { .. } => "non_positive",
            SkipReason::PeriodOutOfRange { .. } => "period_out_of_range",
            SkipReason::UnknownField => "unknown_field",
            SkipReason::NationalInRegional => "national_in_regional",
            SkipReason::MalformedRow { .. } => "malformed_row",
        }
    }

    /// Descartes estructurales (fuente u hoja completa), frente a ruido de fila.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SkipReason::SourceUnavailable { .. }
                | SkipReason::WorkbookUnreadable { .. }
                | SkipReason::SheetUnreadable { .. }
                | SkipReason::SheetNotFound { .. }
                | SkipReason::SheetCapReached { .. }
                | SkipReason::LayoutMismatch { .. }
                | SkipReason::HeaderRowMissing { .. }
                | SkipReason::DateColumnNotFound { .. }
                | SkipReason::YearRowNotFound { .. }
                | SkipReason::MonthRowMissing { .. }
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SourceUnavailable { url, message } => write!(f, "source {} unavailable: {}", url, message),
            SkipReason::WorkbookUnreadable { file, message } => write!(f, "workbook {} unreadable: {}", file, message),
            SkipReason::SheetUnreadable { sheet, message } => write!(f, "sheet '{}' unreadable: {}", sheet, message),
            SkipReason::SheetNotFound { kind } => write!(f, "no {} sheet in workbook", kind),
            SkipReason::SheetCapReached { file, skipped } => write!(f, "{}: {} sheets beyond cap", file, skipped),
            SkipReason::LayoutMismatch { file, layout } => write!(f, "{}: {} layout cannot be read here", file, layout),
            SkipReason::HeaderRowMissing { sheet, offset } => write!(f, "sheet '{}' has no row at header offset {}", sheet, offset),
            SkipReason::DateColumnNotFound { sheet } => write!(f, "sheet '{}' has no date column", sheet),
            SkipReason::YearRowNotFound { sheet } => write!(f, "sheet '{}' has no year row", sheet),
            SkipReason::MonthRowMissing { sheet } => write!(f, "sheet '{}' ends at the year row", sheet),
            SkipReason::EmptyOperator { sheet, row } => write!(f, "sheet '{}' row {}: empty operator", sheet, row),
            SkipReason::InvalidDate { row } => write!(f, "row {}: invalid date", row),
            SkipReason::EmptyValue { row, column } => write!(f, "row {} column '{}': empty", row, column),
            SkipReason::NonNumeric { row, column } => write!(f, "row {} column '{}': not a number", row, column),
            SkipReason::NonPositive { row, column } => write!(f, "row {} column '{}': not positive", row, column),
            SkipReason::PeriodOutOfRange { year, month } => write!(f, "period {}-{} out of range", year, month),
            SkipReason::UnknownField => write!(f, "field is Unknown"),
            SkipReason::NationalInRegional => write!(f, "national column in regional sheet"),
            SkipReason::MalformedRow { message } => write!(f, "malformed row: {}", message),
        }
    }
}

const MAX_SAMPLES: usize = 20;

/// Acumulador de descartes: conteo por tipo y una muestra acotada de detalles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkipLog {
    pub counts: BTreeMap<&'static str, usize>,
    pub samples: Vec<String>,
}

impl SkipLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: SkipReason) {
        if reason.is_structural() {
            log::warn!("{}", reason);
        } else {
            log::debug!("{}", reason);
        }
        *self.counts.entry(reason.kind()).or_default() += 1;
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(reason.to_string());
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Resultado de una tabla de hechos en una corrida.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: FactTable,
    pub files_seen: usize,
    pub sheets_parsed: usize,
    pub records_extracted: usize,
    pub records_loaded: usize,
    /// `false` cuando la tabla no se tocó (fuente caída o sin datos).
    pub loaded: bool,
    pub skips: SkipLog,
}

impl TableReport {
    pub fn new(table: FactTable) -> Self {
        TableReport {
            table,
            files_seen: 0,
            sheets_parsed: 0,
            records_extracted: 0,
            records_loaded: 0,
            loaded: false,
            skips: SkipLog::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn start(started_at: DateTime<Utc>) -> Self {
        RunReport { started_at, finished_at: None, tables: Vec::new() }
    }

    pub fn table(&self, table: FactTable) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }

    pub fn total_loaded(&self) -> usize {
        self.tables.iter().map(|t| t.records_loaded).sum()
    }
}
