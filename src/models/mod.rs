// Estructuras de datos principales: las tres tablas de hechos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tablas de hechos que produce una corrida del ETL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactTable {
    Royalties,
    Production,
    Demand,
}

impl FactTable {
    pub const ALL: [FactTable; 3] = [FactTable::Royalties, FactTable::Production, FactTable::Demand];

    /// Nombre de la tabla en el almacén.
    pub fn table_name(&self) -> &'static str {
        match self {
            FactTable::Royalties => "royalties",
            FactTable::Production => "production",
            FactTable::Demand => "demand",
        }
    }

    pub fn parse(s: &str) -> Option<FactTable> {
        match s.trim().to_lowercase().as_str() {
            "royalties" | "regalias" => Some(FactTable::Royalties),
            "production" | "produccion" => Some(FactTable::Production),
            "demand" | "demanda" => Some(FactTable::Demand),
            _ => None,
        }
    }
}

impl fmt::Display for FactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Rango de años aceptado para cualquier registro.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

pub fn valid_period(year: i32, month: u32) -> bool {
    YEAR_RANGE.contains(&year) && (1..=12).contains(&month)
}

/// Producción mensual de un campo (volumen en KPC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRecord {
    pub field: String,
    pub operator: String,
    pub department: String,
    pub municipality: String,
    pub year: i32,
    pub month: u32,
    pub monthly_volume: f64,
    pub load_timestamp: DateTime<Utc>,
}

/// Escenario de proyección de demanda.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scenario {
    Low,
    Medium,
    High,
    Historical,
    /// Etiqueta literal de la columna cuando no se reconoce el escenario.
    Other(String),
}

impl Scenario {
    pub fn as_str(&self) -> &str {
        match self {
            Scenario::Low => "Low",
            Scenario::Medium => "Medium",
            Scenario::High => "High",
            Scenario::Historical => "Historical",
            Scenario::Other(s) => s.as_str(),
        }
    }

    /// Infere el escenario a partir del nombre de la columna.
    /// El orden importa: "bajo" se revisa antes que "alto", "medio" e "hist".
    pub fn from_variable(variable: &str) -> Scenario {
        let low = variable.to_lowercase();
        if low.contains("bajo") {
            Scenario::Low
        } else if low.contains("alto") {
            Scenario::High
        } else if low.contains("medio") {
            Scenario::Medium
        } else if low.contains("hist") {
            Scenario::Historical
        } else {
            Scenario::Other(variable.to_string())
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Scenario {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub const SECTOR_AGGREGATE: &str = "Aggregate";
pub const SECTOR_UNKNOWN: &str = "Unknown";
pub const REGION_NATIONAL: &str = "Nacional";

/// Demanda mensual proyectada (GBTUD).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandRecord {
    pub sector: String,
    pub region: String,
    pub year: i32,
    pub month: u32,
    pub scenario: Scenario,
    pub demand_value: f64,
    pub load_timestamp: DateTime<Utc>,
}

/// Liquidación de regalías tal como la publica el API Socrata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoyaltyRecord {
    pub department: Option<String>,
    pub municipality: Option<String>,
    pub field: Option<String>,
    pub contract: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub royalty_volume: f64,
    pub avg_exchange_rate: f64,
    pub production_type: Option<String>,
    pub hydrocarbon_type: Option<String>,
    pub regime: Option<String>,
    pub taxable_production: f64,
    pub price_usd: f64,
    pub royalty_pct: f64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub settled_value_cop: f64,
    pub load_timestamp: DateTime<Utc>,
}

/// Enlace publicado en una página índice (`href`, texto del ancla).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub href: String,
    #[serde(default)]
    pub text: String,
}

impl SourceLink {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        SourceLink { href: href.into(), text: text.into() }
    }
}
