use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::FactTable;
use crate::store::FactConn;

/// Opciones de filtro de una tabla: valores distintos por dimensión y años.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub table: FactTable,
    pub dimensions: BTreeMap<String, Vec<String>>,
    pub years: Vec<i64>,
}

/// Conteo de filas y total de la medida principal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    pub table: FactTable,
    pub rows: i64,
    pub measure: &'static str,
    pub total: f64,
}

/// Columnas de texto que se ofrecen como filtro.
pub fn filter_dimensions(table: FactTable) -> &'static [&'static str] {
    match table {
        FactTable::Royalties => &["department", "field", "hydrocarbon_type"],
        FactTable::Production => &["department", "field", "operator"],
        FactTable::Demand => &["sector", "region", "scenario"],
    }
}

pub fn measure_column(table: FactTable) -> &'static str {
    match table {
        FactTable::Royalties => "settled_value_cop",
        FactTable::Production => "monthly_volume",
        FactTable::Demand => "demand_value",
    }
}

pub fn filter_options(conn: &mut FactConn, table: FactTable) -> Result<FilterOptions> {
    let mut dimensions = BTreeMap::new();
    for column in filter_dimensions(table) {
        dimensions.insert(column.to_string(), conn.distinct_text(table, column)?);
    }
    let years = conn.distinct_years(table)?;
    Ok(FilterOptions { table, dimensions, years })
}

pub fn table_stats(conn: &mut FactConn, table: FactTable) -> Result<TableStats> {
    let measure = measure_column(table);
    let (rows, total) = conn.count_and_sum(table, measure)?;
    Ok(TableStats { table, rows, measure, total })
}
