use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::io::Cursor;

use crate::error::Result;

/// Rejilla de celdas en coordenadas absolutas de la hoja (fila 0 = fila 1 de Excel).
pub type Grid = Vec<Vec<Data>>;

/// Convierte un `Data` de calamine a String (versión genérica para celdas)
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.is_finite() && (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Celda vacía o marcador de ausencia (`nan`, `NaN`, texto en blanco).
pub fn is_blank(c: &Data) -> bool {
    match c {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => {
            let t = s.trim();
            t.is_empty() || t.eq_ignore_ascii_case("nan")
        }
        Data::Float(f) => f.is_nan(),
        _ => false,
    }
}

/// Valor numérico finito de una celda. Los textos se aceptan si parsean
/// completos (`" 12.5 "` sí, `"1.234,5"` no).
pub fn cell_to_f64(c: &Data) -> Option<f64> {
    let v = match c {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Celda con tipo fecha (no texto que parezca fecha).
pub fn is_date_typed(c: &Data) -> bool {
    matches!(c, Data::DateTime(_) | Data::DateTimeIso(_))
}

/// Intenta interpretar la celda como fecha. Los números sin formato de fecha
/// no se consideran fechas.
pub fn cell_to_date(c: &Data) -> Option<NaiveDate> {
    match c {
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()).map(|d| d.date()),
        Data::DateTimeIso(s) => parse_date_text(s),
        Data::String(s) => parse_date_text(s),
        _ => None,
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    for f in DATETIME_FORMATS {
        if let Ok(d) = NaiveDateTime::parse_from_str(t, f) {
            return Some(d.date());
        }
    }
    for f in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, f) {
            return Some(d);
        }
    }
    // "2024-01" → primer día del mes
    NaiveDate::parse_from_str(&format!("{}-01", t), "%Y-%m-%d").ok()
}

/// Último serial representable: 9999-12-31.
pub const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Serial de Excel (sistema 1900) a fecha-hora. Seriales negativos o más allá
/// del año 9999 no son fechas.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    base.checked_add_signed(TimeDelta::try_days(days)?)?
        .checked_add_signed(TimeDelta::try_seconds(secs)?)
}

/// Expande un `Range` de calamine a coordenadas absolutas: calamine recorta las
/// filas y columnas vacías del inicio, y los desplazamientos de encabezado se
/// miden desde la fila 1 de Excel.
pub fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row0, col0) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Vec::new(),
    };
    let mut grid: Grid = vec![Vec::new(); row0];
    for r in range.rows() {
        let mut row = vec![Data::Empty; col0];
        row.extend(r.iter().cloned());
        grid.push(row);
    }
    grid
}

/// Libro de Excel abierto desde memoria (xlsx/xlsm/xls/xlsb según contenido).
pub struct Workbook {
    pub name: String,
    sheets: Sheets<Cursor<Vec<u8>>>,
}

impl Workbook {
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        Ok(Workbook { name: name.to_string(), sheets })
    }

    /// Nombres de hojas en el orden que reporta la librería.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    pub fn grid(&mut self, sheet: &str) -> Result<Grid> {
        let range = self.sheets.worksheet_range(sheet)?;
        Ok(range_to_grid(&range))
    }
}
