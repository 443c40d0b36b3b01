use rusqlite::Connection;
use std::fmt;
use std::fs;
use std::path::Path;

use postgres::{Client, NoTls};

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::models::FactTable;
use crate::store::{table_columns, SqlValue};

/// Conexión al almacén de hechos: SQLite local o Postgres remoto.
pub enum FactConn {
    Sqlite(Connection),
    Postgres(Box<Client>),
}

impl fmt::Debug for FactConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactConn::Sqlite(_) => write!(f, "FactConn::Sqlite(..)"),
            FactConn::Postgres(_) => write!(f, "FactConn::Postgres(..)"),
        }
    }
}

/// Abre el almacén según la configuración. Acepta `sqlite://`, `file://`,
/// `postgres://` y `postgresql://`; sin URL usa la ruta SQLite.
pub fn open_fact_connection(config: &EtlConfig) -> Result<FactConn> {
    let conn = match config.db_url.as_deref() {
        Some(url) if url.starts_with("sqlite://") => open_sqlite_file(Path::new(url.trim_start_matches("sqlite://")))?,
        Some(url) if url.starts_with("file://") => open_sqlite_file(Path::new(url.trim_start_matches("file://")))?,
        Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
            let client = Client::connect(url, NoTls)?;
            FactConn::Postgres(Box::new(client))
        }
        Some(url) => return Err(EtlError::Config(format!("SIMGN_DB_URL uses unsupported scheme: {}", url))),
        None => open_sqlite_file(&config.db_path)?,
    };
    log::info!("almacén de hechos: {:?}", conn);
    Ok(conn)
}

fn open_sqlite_file(path: &Path) -> Result<FactConn> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(FactConn::Sqlite(Connection::open(path)?))
}

fn sqlite_type(column: &str) -> &'static str {
    match column {
        "year" | "month" => "INTEGER",
        c if is_real_column(c) => "REAL",
        _ => "TEXT",
    }
}

fn pg_type(column: &str) -> &'static str {
    match column {
        "year" | "month" => "BIGINT",
        c if is_real_column(c) => "DOUBLE PRECISION",
        _ => "TEXT",
    }
}

fn is_real_column(column: &str) -> bool {
    matches!(
        column,
        "royalty_volume"
            | "avg_exchange_rate"
            | "taxable_production"
            | "price_usd"
            | "royalty_pct"
            | "longitude"
            | "latitude"
            | "settled_value_cop"
            | "monthly_volume"
            | "demand_value"
    )
}

fn create_table_sql(table: FactTable, postgres: bool) -> String {
    let (id, ty): (&str, fn(&str) -> &'static str) = if postgres {
        ("id BIGSERIAL PRIMARY KEY", pg_type)
    } else {
        ("id INTEGER PRIMARY KEY AUTOINCREMENT", sqlite_type)
    };
    let cols: Vec<String> = table_columns(table).iter().map(|c| format!("{} {}", c, ty(c))).collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({}, {})", table.table_name(), id, cols.join(", "))
}

/// `INSERT` con marcadores `?N` (SQLite) o `$N` (Postgres).
pub fn insert_sql(table: FactTable, columns: &[&str], postgres: bool) -> String {
    let marks: Vec<String> = (1..=columns.len())
        .map(|i| if postgres { format!("${}", i) } else { format!("?{}", i) })
        .collect();
    format!("INSERT INTO {} ({}) VALUES ({})", table.table_name(), columns.join(", "), marks.join(", "))
}

impl FactConn {
    pub fn open_in_memory() -> Result<FactConn> {
        Ok(FactConn::Sqlite(Connection::open_in_memory()?))
    }

    /// Crea las tres tablas de hechos si no existen.
    pub fn init_schema(&mut self) -> Result<()> {
        match self {
            FactConn::Sqlite(conn) => {
                for table in FactTable::ALL {
                    conn.execute(&create_table_sql(table, false), [])?;
                }
            }
            FactConn::Postgres(client) => {
                let ddl: Vec<String> = FactTable::ALL.iter().map(|t| create_table_sql(*t, true)).collect();
                client.batch_execute(&ddl.join(";\n"))?;
            }
        }
        Ok(())
    }

    /// Una transacción: borrado opcional de la tabla y luego las filas del lote.
    /// Cualquier error deshace el lote completo.
    pub fn write_batch(
        &mut self,
        table: FactTable,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
        truncate_first: bool,
    ) -> Result<()> {
        let delete = format!("DELETE FROM {}", table.table_name());
        match self {
            FactConn::Sqlite(conn) => {
                let tx = conn.transaction()?;
                if truncate_first {
                    tx.execute(&delete, [])?;
                }
                {
                    let mut stmt = tx.prepare(&insert_sql(table, columns, false))?;
                    for row in rows {
                        stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                    }
                }
                tx.commit()?;
            }
            FactConn::Postgres(client) => {
                let mut tx = client.transaction()?;
                if truncate_first {
                    tx.batch_execute(&delete)?;
                }
                let stmt = tx.prepare(&insert_sql(table, columns, true))?;
                for row in rows {
                    let owned: Vec<Box<dyn postgres::types::ToSql + Sync>> = row.iter().map(SqlValue::pg_param).collect();
                    let params: Vec<&(dyn postgres::types::ToSql + Sync)> = owned.iter().map(|b| b.as_ref()).collect();
                    tx.execute(&stmt, &params)?;
                }
                tx.commit()?;
            }
        }
        Ok(())
    }

    /// Valores distintos y no vacíos de una columna de texto, ordenados.
    pub fn distinct_text(&mut self, table: FactTable, column: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {c} FROM {t} WHERE {c} IS NOT NULL AND {c} <> '' ORDER BY {c}",
            c = column,
            t = table.table_name()
        );
        match self {
            FactConn::Sqlite(conn) => {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r?);
                }
                Ok(out)
            }
            FactConn::Postgres(client) => {
                let rows = client.query(sql.as_str(), &[])?;
                Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
            }
        }
    }

    /// Años distintos de la tabla, ordenados.
    pub fn distinct_years(&mut self, table: FactTable) -> Result<Vec<i64>> {
        let sql = format!("SELECT DISTINCT year FROM {} WHERE year IS NOT NULL ORDER BY year", table.table_name());
        match self {
            FactConn::Sqlite(conn) => {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r?);
                }
                Ok(out)
            }
            FactConn::Postgres(client) => {
                let rows = client.query(sql.as_str(), &[])?;
                Ok(rows.iter().map(|r| r.get::<_, i64>(0)).collect())
            }
        }
    }

    /// Cantidad de filas y suma de una columna numérica.
    pub fn count_and_sum(&mut self, table: FactTable, measure: &str) -> Result<(i64, f64)> {
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM({}), 0.0) FROM {}",
            measure,
            table.table_name()
        );
        match self {
            FactConn::Sqlite(conn) => {
                let (count, sum) = conn.query_row(&sql, [], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)))?;
                Ok((count, sum))
            }
            FactConn::Postgres(client) => {
                let row = client.query_one(sql.as_str(), &[])?;
                Ok((row.get::<_, i64>(0), row.get::<_, f64>(1)))
            }
        }
    }
}
