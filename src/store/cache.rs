//! Caché en memoria de las opciones de filtro.
//!
//! Calcular las opciones implica varios `SELECT DISTINCT` sobre tablas grandes;
//! el resultado se guarda por tabla con un TTL de 24 horas. La carga del ETL
//! debe llamar a `invalidate` (o `invalidate_all`) después de reemplazar una
//! tabla.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::models::FactTable;
use crate::report::RunReport;
use crate::store::FilterOptions;

/// Fuente de la hora actual; los tests inyectan una fija.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Entry {
    value: Arc<FilterOptions>,
    stored_at: DateTime<Utc>,
}

pub struct FilterCache<C: Clock> {
    clock: C,
    ttl: Duration,
    entries: Mutex<HashMap<FactTable, Entry>>,
}

impl FilterCache<SystemClock> {
    pub fn new() -> Self {
        FilterCache::with_clock(SystemClock)
    }
}

impl Default for FilterCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FilterCache<C> {
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn with_clock(clock: C) -> Self {
        FilterCache { clock, ttl: Duration::hours(Self::DEFAULT_TTL_HOURS), entries: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FactTable, Entry>> {
        // un pánico con el lock tomado no deja el mapa inconsistente
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Devuelve la entrada vigente o la calcula con `load` y la guarda.
    /// Un error de `load` no se guarda.
    pub fn get_or_load<F>(&self, table: FactTable, load: F) -> Result<Arc<FilterOptions>>
    where
        F: FnOnce() -> Result<FilterOptions>,
    {
        let now = self.clock.now();
        {
            let guard = self.lock();
            if let Some(entry) = guard.get(&table) {
                if now - entry.stored_at < self.ttl {
                    return Ok(Arc::clone(&entry.value));
                }
            }
        }

        let value = Arc::new(load()?);
        self.lock().insert(table, Entry { value: Arc::clone(&value), stored_at: now });
        log::debug!("filtros de {} recalculados", table);
        Ok(value)
    }

    pub fn invalidate(&self, table: FactTable) {
        self.lock().remove(&table);
    }

    pub fn invalidate_all(&self) {
        self.lock().clear();
    }

    /// Invalida las tablas que la corrida reemplazó.
    pub fn invalidate_loaded(&self, report: &RunReport) {
        for t in report.tables.iter().filter(|t| t.loaded) {
            self.invalidate(t.table);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
