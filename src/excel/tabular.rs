//! Forma A: hojas tabulares "limpias" (demanda UPME).
//!
//! Una vez aplicado el desplazamiento de encabezado, la primera columna de
//! fecha es el eje temporal y el resto de columnas con encabezado se
//! despivotan en tuplas `(fecha, variable, valor)`.

use calamine::Data;
use chrono::NaiveDate;

use crate::excel::io::{cell_to_date, cell_to_f64, cell_to_string, is_blank, is_date_typed, Grid};
use crate::excel::layout::TabularLayout;
use crate::report::{SkipLog, SkipReason};

/// Hoja recortada en su encabezado real.
#[derive(Debug, Clone)]
pub struct TabularSheet {
    pub name: String,
    pub headers: Vec<String>,
    /// (fila absoluta en la hoja, celdas)
    pub rows: Vec<(usize, Vec<Data>)>,
}

impl TabularSheet {
    /// Toma la fila `header_offset` como encabezado y las siguientes como datos.
    pub fn from_grid(name: &str, grid: &Grid, layout: TabularLayout) -> Result<TabularSheet, SkipReason> {
        let header_row = grid.get(layout.header_offset).ok_or_else(|| SkipReason::HeaderRowMissing {
            sheet: name.to_string(),
            offset: layout.header_offset,
        })?;
        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
        let rows = grid
            .iter()
            .enumerate()
            .skip(layout.header_offset + 1)
            .map(|(idx, r)| (idx, r.clone()))
            .collect();
        Ok(TabularSheet { name: name.to_string(), headers, rows })
    }

    fn cell(&self, row: &[Data], col: usize) -> Data {
        row.get(col).cloned().unwrap_or(Data::Empty)
    }

    /// Columna del eje temporal: encabezado con "fecha", "año" o "mes", o una
    /// primera celda de datos con tipo fecha. La primera que cumpla gana.
    pub fn date_column(&self) -> Option<usize> {
        let first = self.rows.first().map(|(_, r)| r.as_slice()).unwrap_or(&[]);
        let width = self.headers.len().max(first.len());
        (0..width).find(|&col| {
            let h = self.headers.get(col).map(|h| h.to_lowercase()).unwrap_or_default();
            h.contains("fecha") || h.contains("año") || h.contains("mes") || is_date_typed(&self.cell(first, col))
        })
    }

    /// Columnas con encabezado no vacío distintas del eje temporal.
    pub fn variable_columns(&self, date_col: usize) -> Vec<(usize, String)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != date_col && !h.is_empty() && !h.starts_with("Unnamed"))
            .map(|(i, h)| (i, h.clone()))
            .collect()
    }
}

/// Tupla larga resultante del despivote.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTuple {
    pub row: usize,
    pub date: NaiveDate,
    pub variable: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Unpivoted {
    pub tuples: Vec<LongTuple>,
    /// Filas con fecha válida.
    pub date_rows: usize,
    pub variable_columns: usize,
    /// Pares (fila, columna) evaluados antes del filtro numérico.
    pub cells_considered: usize,
}

/// Despivota la hoja. Sin eje temporal la hoja completa se descarta.
pub fn unpivot(sheet: &TabularSheet, skips: &mut SkipLog) -> Result<Unpivoted, SkipReason> {
    let date_col = sheet
        .date_column()
        .ok_or_else(|| SkipReason::DateColumnNotFound { sheet: sheet.name.clone() })?;
    let columns = sheet.variable_columns(date_col);

    let mut out = Unpivoted { variable_columns: columns.len(), ..Default::default() };
    for (row_idx, row) in &sheet.rows {
        let date = match cell_to_date(&sheet.cell(row, date_col)) {
            Some(d) => d,
            None => {
                skips.record(SkipReason::InvalidDate { row: *row_idx });
                continue;
            }
        };
        out.date_rows += 1;

        for (col, name) in &columns {
            out.cells_considered += 1;
            let cell = sheet.cell(row, *col);
            if is_blank(&cell) {
                skips.record(SkipReason::EmptyValue { row: *row_idx, column: name.clone() });
                continue;
            }
            match cell_to_f64(&cell) {
                Some(value) => out.tuples.push(LongTuple { row: *row_idx, date, variable: name.clone(), value }),
                None => skips.record(SkipReason::NonNumeric { row: *row_idx, column: name.clone() }),
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn scenario_grid() -> Grid {
        vec![
            vec![s("Proyección de demanda"), Data::Empty, Data::Empty, Data::Empty],
            vec![s("Fecha"), s("Bajo"), s("Medio"), s("Alto")],
            vec![s("2024-01-01"), Data::Float(100.0), Data::Float(120.0), Data::Float(140.0)],
            vec![s("2024-02-01"), Data::Float(101.0), s("n.d."), Data::Float(141.0)],
            vec![s("Fuente: UPME"), Data::Empty, Data::Empty, Data::Empty],
        ]
    }

    #[test]
    fn header_offset_selects_header_row() {
        let sheet = TabularSheet::from_grid("Esc", &scenario_grid(), TabularLayout { header_offset: 1 }).unwrap();
        assert_eq!(sheet.headers, vec!["Fecha", "Bajo", "Medio", "Alto"]);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].0, 2);
    }

    #[test]
    fn missing_header_row_is_a_skip() {
        let err = TabularSheet::from_grid("Esc", &vec![vec![s("x")]], TabularLayout { header_offset: 3 }).unwrap_err();
        assert_eq!(err.kind(), "header_row_missing");
    }

    #[test]
    fn unpivot_counts_rows_times_columns() {
        let sheet = TabularSheet::from_grid("Esc", &scenario_grid(), TabularLayout { header_offset: 1 }).unwrap();
        let mut skips = SkipLog::new();
        let out = unpivot(&sheet, &mut skips).unwrap();
        assert_eq!(out.date_rows, 2);
        assert_eq!(out.variable_columns, 3);
        assert_eq!(out.cells_considered, 6);
        // "n.d." no es numérico
        assert_eq!(out.tuples.len(), 5);
        assert_eq!(skips.count("non_numeric"), 1);
        assert_eq!(skips.count("invalid_date"), 1);
    }

    #[test]
    fn date_column_by_type_when_header_is_blank() {
        let grid = vec![
            vec![Data::Empty, s("Costa"), s("Centro")],
            vec![Data::DateTimeIso("2030-06-01T00:00:00".into()), Data::Int(5), Data::Int(6)],
        ];
        let sheet = TabularSheet::from_grid("Reg", &grid, TabularLayout { header_offset: 0 }).unwrap();
        assert_eq!(sheet.date_column(), Some(0));
        let out = unpivot(&sheet, &mut SkipLog::new()).unwrap();
        assert_eq!(out.tuples.len(), 2);
        assert_eq!(out.tuples[0].date, NaiveDate::from_ymd_opt(2030, 6, 1).unwrap());
    }

    #[test]
    fn no_date_column_skips_sheet() {
        let grid = vec![vec![s("Region"), s("Valor")], vec![s("Costa"), Data::Float(1.0)]];
        let sheet = TabularSheet::from_grid("X", &grid, TabularLayout { header_offset: 0 }).unwrap();
        let err = unpivot(&sheet, &mut SkipLog::new()).unwrap_err();
        assert_eq!(err, SkipReason::DateColumnNotFound { sheet: "X".into() });
    }
}
