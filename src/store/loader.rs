//! Reemplazo completo de una tabla de hechos: borrado y carga por lotes.

use crate::error::{EtlError, Result};
use crate::models::FactTable;
use crate::store::{FactConn, FactRow, SqlValue};

/// Filas por lote; cada lote es una transacción.
pub const BATCH_SIZE: usize = 5000;

/// Destino de la carga. El lote es atómico: o entran todas sus filas (y el
/// borrado, si se pidió) o ninguna.
pub trait FactStore {
    fn write_batch(
        &mut self,
        table: FactTable,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
        truncate_first: bool,
    ) -> Result<()>;
}

impl FactStore for FactConn {
    fn write_batch(
        &mut self,
        table: FactTable,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
        truncate_first: bool,
    ) -> Result<()> {
        FactConn::write_batch(self, table, columns, rows, truncate_first)
    }
}

/// Borra la tabla de `R` y carga `records` en lotes de `BATCH_SIZE`.
///
/// El borrado va en la transacción del primer lote. Un lote que falla se
/// deshace, los siguientes no se intentan y el error sube envuelto en
/// `EtlError::Load`. Devuelve la cantidad de filas insertadas.
pub fn replace_table<S, R>(store: &mut S, records: &[R]) -> Result<usize>
where
    S: FactStore + ?Sized,
    R: FactRow,
{
    let table = R::TABLE;
    let columns = R::columns();

    if records.is_empty() {
        store
            .write_batch(table, columns, &[], true)
            .map_err(|e| EtlError::Load { table, batch: 0, source: Box::new(e) })?;
        log::info!("{}: tabla vaciada, sin registros para cargar", table);
        return Ok(0);
    }

    let total_batches = records.len().div_ceil(BATCH_SIZE);
    let mut loaded = 0;
    for (batch, chunk) in records.chunks(BATCH_SIZE).enumerate() {
        let rows: Vec<Vec<SqlValue>> = chunk.iter().map(|r| r.values()).collect();
        store
            .write_batch(table, columns, &rows, batch == 0)
            .map_err(|e| EtlError::Load { table, batch, source: Box::new(e) })?;
        loaded += rows.len();
        log::info!("{}: lote {}/{} ({} registros)", table, batch + 1, total_batches, loaded);
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductionRecord;
    use chrono::Utc;

    struct Recorder {
        calls: Vec<(usize, bool)>,
    }

    impl FactStore for Recorder {
        fn write_batch(&mut self, _: FactTable, _: &[&str], rows: &[Vec<SqlValue>], truncate_first: bool) -> Result<()> {
            self.calls.push((rows.len(), truncate_first));
            Ok(())
        }
    }

    fn records(n: usize) -> Vec<ProductionRecord> {
        let ts = Utc::now();
        (0..n)
            .map(|i| ProductionRecord {
                field: format!("F{}", i),
                operator: "Op".into(),
                department: String::new(),
                municipality: String::new(),
                year: 2023,
                month: 1,
                monthly_volume: 1.0,
                load_timestamp: ts,
            })
            .collect()
    }

    #[test]
    fn batches_of_five_thousand_with_delete_in_first() {
        let mut store = Recorder { calls: Vec::new() };
        let n = replace_table(&mut store, &records(12_001)).unwrap();
        assert_eq!(n, 12_001);
        assert_eq!(store.calls, vec![(5000, true), (5000, false), (2001, false)]);
    }
}
