//! Almacén de hechos: conexión, esquema, carga y lecturas.

pub mod cache;
pub mod db;
pub mod loader;
pub mod queries;

use crate::models::{DemandRecord, FactTable, ProductionRecord, RoyaltyRecord};

pub use cache::{Clock, FilterCache, SystemClock};
pub use db::{open_fact_connection, FactConn};
pub use loader::{replace_table, FactStore, BATCH_SIZE};
pub use queries::{filter_options, table_stats, FilterOptions, TableStats};

/// Valor de una celda a insertar. Las variantes llevan el tipo aun cuando el
/// valor es nulo para que Postgres acepte el parámetro.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Real(Option<f64>),
}

impl SqlValue {
    pub fn text(s: &str) -> Self {
        SqlValue::Text(Some(s.to_string()))
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match self {
            SqlValue::Text(v) => v.to_sql(),
            SqlValue::Int(v) => v.to_sql(),
            SqlValue::Real(v) => v.to_sql(),
        }
    }
}

impl SqlValue {
    /// Parámetro con dueño para el cliente de Postgres.
    pub fn pg_param(&self) -> Box<dyn postgres::types::ToSql + Sync> {
        match self {
            SqlValue::Text(v) => Box::new(v.clone()),
            SqlValue::Int(v) => Box::new(*v),
            SqlValue::Real(v) => Box::new(*v),
        }
    }
}

/// Registro que se persiste en una tabla de hechos.
pub trait FactRow {
    const TABLE: FactTable;

    /// Columnas en el orden de `values`.
    fn columns() -> &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;
}

/// Columnas por tabla. `load_timestamp` se guarda como texto RFC 3339.
pub fn table_columns(table: FactTable) -> &'static [&'static str] {
    match table {
        FactTable::Royalties => &[
            "department",
            "municipality",
            "field",
            "contract",
            "year",
            "month",
            "royalty_volume",
            "avg_exchange_rate",
            "production_type",
            "hydrocarbon_type",
            "regime",
            "taxable_production",
            "price_usd",
            "royalty_pct",
            "longitude",
            "latitude",
            "settled_value_cop",
            "load_timestamp",
        ],
        FactTable::Production => &[
            "field",
            "operator",
            "department",
            "municipality",
            "year",
            "month",
            "monthly_volume",
            "load_timestamp",
        ],
        FactTable::Demand => &["sector", "region", "year", "month", "scenario", "demand_value", "load_timestamp"],
    }
}

impl FactRow for ProductionRecord {
    const TABLE: FactTable = FactTable::Production;

    fn columns() -> &'static [&'static str] {
        table_columns(FactTable::Production)
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(&self.field),
            SqlValue::text(&self.operator),
            SqlValue::text(&self.department),
            SqlValue::text(&self.municipality),
            SqlValue::Int(Some(self.year as i64)),
            SqlValue::Int(Some(self.month as i64)),
            SqlValue::Real(Some(self.monthly_volume)),
            SqlValue::Text(Some(self.load_timestamp.to_rfc3339())),
        ]
    }
}

impl FactRow for DemandRecord {
    const TABLE: FactTable = FactTable::Demand;

    fn columns() -> &'static [&'static str] {
        table_columns(FactTable::Demand)
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(&self.sector),
            SqlValue::text(&self.region),
            SqlValue::Int(Some(self.year as i64)),
            SqlValue::Int(Some(self.month as i64)),
            SqlValue::text(self.scenario.as_str()),
            SqlValue::Real(Some(self.demand_value)),
            SqlValue::Text(Some(self.load_timestamp.to_rfc3339())),
        ]
    }
}

impl FactRow for RoyaltyRecord {
    const TABLE: FactTable = FactTable::Royalties;

    fn columns() -> &'static [&'static str] {
        table_columns(FactTable::Royalties)
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.department.clone()),
            SqlValue::Text(self.municipality.clone()),
            SqlValue::Text(self.field.clone()),
            SqlValue::Text(self.contract.clone()),
            SqlValue::Int(self.year.map(i64::from)),
            SqlValue::Int(self.month.map(i64::from)),
            SqlValue::Real(Some(self.royalty_volume)),
            SqlValue::Real(Some(self.avg_exchange_rate)),
            SqlValue::Text(self.production_type.clone()),
            SqlValue::Text(self.hydrocarbon_type.clone()),
            SqlValue::Text(self.regime.clone()),
            SqlValue::Real(Some(self.taxable_production)),
            SqlValue::Real(Some(self.price_usd)),
            SqlValue::Real(Some(self.royalty_pct)),
            SqlValue::Real(self.longitude),
            SqlValue::Real(self.latitude),
            SqlValue::Real(Some(self.settled_value_cop)),
            SqlValue::Text(Some(self.load_timestamp.to_rfc3339())),
        ]
    }
}
