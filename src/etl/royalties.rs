//! Regalías desde el API Socrata de datos.gov.co, paginado de a 5000.

use serde_json::{Map, Value};

use crate::etl::{Extraction, Normalizer};
use crate::fetch::{timeouts, SourceFetcher};
use crate::geo::canonical_department;
use crate::models::{FactTable, RoyaltyRecord};
use crate::report::SkipReason;

pub const SOCRATA_URL: &str = "https://www.datos.gov.co/resource/j7js-yk74.json";
pub const PAGE_LIMIT: usize = 5000;
/// Tope de páginas por corrida.
pub const MAX_PAGES: usize = 400;

pub fn page_url(offset: usize) -> String {
    format!("{}?$limit={}&$offset={}", SOCRATA_URL, PAGE_LIMIT, offset)
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Número de un campo: número JSON o texto con coma decimal. `Ok(None)` si
/// falta o está vacío.
fn number(obj: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
    let parsed = match obj.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("{}: not a number", key)),
    }
}

fn integer(obj: &Map<String, Value>, key: &str) -> Result<Option<i64>, String> {
    match number(obj, key)? {
        Some(v) if v.fract() == 0.0 => Ok(Some(v as i64)),
        Some(_) => Err(format!("{}: not an integer", key)),
        None => Ok(None),
    }
}

/// Objeto del API → registro. Medidas ausentes valen 0; coordenadas ausentes
/// quedan nulas.
pub fn parse_royalty(obj: &Map<String, Value>, normalizer: &Normalizer) -> Result<RoyaltyRecord, String> {
    let measure = |key: &str| number(obj, key).map(|v| v.unwrap_or(0.0));
    let year = integer(obj, "a_o")?.map(|y| y as i32);
    let month = integer(obj, "mes")?.map(|m| m as u32);
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(format!("mes {} out of range", m));
        }
    }
    Ok(RoyaltyRecord {
        department: text(obj, "departamento").map(|d| canonical_department(&d)),
        municipality: text(obj, "municipio"),
        field: text(obj, "campo"),
        contract: text(obj, "contrato"),
        year,
        month,
        royalty_volume: measure("volumenregaliablskpc")?,
        avg_exchange_rate: measure("trmpromedio")?,
        production_type: text(obj, "tipoprod"),
        hydrocarbon_type: text(obj, "tipohidrocarburo"),
        regime: text(obj, "regimenreg"),
        taxable_production: measure("prodgravableblskpc")?,
        price_usd: measure("preciohidrocarburousd")?,
        royalty_pct: measure("porcregalia")?,
        longitude: number(obj, "longitud")?,
        latitude: number(obj, "latitud")?,
        settled_value_cop: measure("regaliascop")?,
        load_timestamp: normalizer.load_timestamp(),
    })
}

/// Descarga todas las páginas. Una página que falla deja la fuente como no
/// disponible y la tabla sin tocar.
pub fn extract_royalties(fetcher: &dyn SourceFetcher, normalizer: &Normalizer) -> Extraction<RoyaltyRecord> {
    let mut out = Extraction::new(FactTable::Royalties);
    let mut previous: Option<Vec<u8>> = None;

    for page in 0..MAX_PAGES {
        let url = page_url(page * PAGE_LIMIT);
        let bytes = match fetcher.fetch(&url, timeouts::ROYALTIES_PAGE) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("regalías: página {} falló: {}", page, e);
                return Extraction::unavailable(FactTable::Royalties, &url, e.to_string());
            }
        };
        // una fuente que ignora el offset devuelve la misma página
        if previous.as_deref() == Some(bytes.as_slice()) {
            log::warn!("regalías: página {} repetida, fin de la paginación", page);
            break;
        }
        let rows: Vec<Value> = match serde_json::from_slice(&bytes) {
            Ok(Value::Array(rows)) => rows,
            Ok(_) => return Extraction::unavailable(FactTable::Royalties, &url, "response is not a JSON array"),
            Err(e) => return Extraction::unavailable(FactTable::Royalties, &url, e.to_string()),
        };
        out.report.files_seen += 1;
        let fetched = rows.len();
        log::info!("regalías: lote offset={} con {} registros", page * PAGE_LIMIT, fetched);

        for row in rows {
            let parsed = match row {
                Value::Object(obj) => parse_royalty(&obj, normalizer),
                _ => Err("row is not an object".to_string()),
            };
            match parsed {
                Ok(r) => out.records.push(r),
                Err(message) => out.report.skips.record(SkipReason::MalformedRow { message }),
            }
        }

        if fetched < PAGE_LIMIT {
            break;
        }
        previous = Some(bytes);
    }

    out.report.records_extracted = out.records.len();
    log::info!("regalías: {} registros extraídos", out.records.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EtlError, Result};
    use crate::models::SourceLink;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    struct Pages(HashMap<String, Vec<u8>>);

    impl SourceFetcher for Pages {
        fn list_links(&self, _: &str, _: Duration) -> Result<Vec<SourceLink>> {
            Ok(Vec::new())
        }

        fn fetch(&self, url: &str, _: Duration) -> Result<Vec<u8>> {
            self.0.get(url).cloned().ok_or_else(|| EtlError::fetch(url, "missing"))
        }
    }

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn decimal_comma_and_defaults() {
        let n = Normalizer::new(Utc::now());
        let r = parse_royalty(
            &obj(json!({
                "departamento": "CASANARE",
                "campo": "CUPIAGUA",
                "a_o": "2021",
                "mes": "3",
                "volumenregaliablskpc": "1234,5",
                "regaliascop": 1000000,
                "latitud": "",
            })),
            &n,
        )
        .unwrap();
        assert_eq!(r.department.as_deref(), Some("Casanare"));
        assert_eq!(r.year, Some(2021));
        assert_eq!(r.month, Some(3));
        assert_eq!(r.royalty_volume, 1234.5);
        assert_eq!(r.settled_value_cop, 1_000_000.0);
        assert_eq!(r.price_usd, 0.0);
        assert_eq!(r.latitude, None);
    }

    #[test]
    fn unparsable_numbers_drop_the_row() {
        let n = Normalizer::new(Utc::now());
        assert!(parse_royalty(&obj(json!({"trmpromedio": "n/a"})), &n).is_err());
        assert!(parse_royalty(&obj(json!({"mes": "13"})), &n).is_err());
    }

    #[test]
    fn paginates_until_short_page() {
        let full: Vec<Value> = (0..PAGE_LIMIT).map(|i| json!({"campo": format!("C{}", i), "mes": "1"})).collect();
        let short = vec![json!({"campo": "X"}), json!("basura")];
        let mut pages = HashMap::new();
        pages.insert(page_url(0), serde_json::to_vec(&full).unwrap());
        pages.insert(page_url(PAGE_LIMIT), serde_json::to_vec(&short).unwrap());

        let out = extract_royalties(&Pages(pages), &Normalizer::new(Utc::now()));
        assert_eq!(out.records.len(), PAGE_LIMIT + 1);
        assert_eq!(out.report.files_seen, 2);
        assert_eq!(out.report.skips.count("malformed_row"), 1);
    }

    #[test]
    fn failed_page_leaves_source_unavailable() {
        let out = extract_royalties(&Pages(HashMap::new()), &Normalizer::new(Utc::now()));
        assert!(out.records.is_empty());
        assert_eq!(out.report.skips.count("source_unavailable"), 1);
    }
}
