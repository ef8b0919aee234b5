//! DuckDB connection adapter

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use duckdb::Connection;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::Dialect;
use crate::ports::{DbConnection, QueryResult};

/// Path accepted by [`DuckDbConnection::open`] for an in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn execution_error(e: duckdb::Error) -> Error {
    Error::execution(None, e.to_string())
}

/// DuckDB connection
///
/// DuckDB follows standard SQL string rules, so values are quoted by
/// doubling single quotes and backslashes are left alone.
pub struct DuckDbConnection {
    conn: Mutex<Option<Connection>>,
    db_path: Option<PathBuf>,
}

impl DuckDbConnection {
    /// Open a file database, or an in-memory one for `:memory:`.
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which show up when another process holds the file briefly.
    pub fn open(db_path: &Path) -> Result<Self> {
        if db_path == Path::new(IN_MEMORY) {
            return Self::open_in_memory();
        }

        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    debug!(path = %db_path.display(), "opened duckdb database");
                    return Ok(Self {
                        conn: Mutex::new(Some(conn)),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        // Exponential backoff: 50ms, 100ms, 200ms, 400ms
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(Error::connection(err_msg));
                }
            }
        }

        Err(Error::connection(last_error.map(|e| e.to_string()).unwrap_or_else(|| {
            format!("Failed to open database after {} retries", MAX_RETRIES)
        })))
    }

    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default()
            .enable_autoload_extension(false)
            .map_err(|e| Error::connection(e.to_string()))?;
        let conn = Connection::open_in_memory_with_flags(config)
            .map_err(|e| Error::connection(e.to_string()))?;
        debug!("opened in-memory duckdb database");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: None,
        })
    }

    /// Attempt to open a database connection (called by open() with retry logic)
    fn try_open_connection(db_path: &Path) -> std::result::Result<Connection, duckdb::Error> {
        // Extension autoloading stays off: cached extensions can fail code signing checks
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// File backing this connection, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| Error::connection("connection lock poisoned"))
    }

    fn get_column_value(row: &duckdb::Row, idx: usize) -> serde_json::Value {
        use duckdb::types::ValueRef;

        match row.get_ref(idx) {
            Ok(ValueRef::Null) => serde_json::Value::Null,
            Ok(ValueRef::Boolean(b)) => serde_json::Value::Bool(b),
            Ok(ValueRef::TinyInt(i)) => serde_json::json!(i),
            Ok(ValueRef::SmallInt(i)) => serde_json::json!(i),
            Ok(ValueRef::Int(i)) => serde_json::json!(i),
            Ok(ValueRef::BigInt(i)) => serde_json::json!(i),
            Ok(ValueRef::HugeInt(i)) => serde_json::json!(i.to_string()),
            Ok(ValueRef::UTinyInt(i)) => serde_json::json!(i),
            Ok(ValueRef::USmallInt(i)) => serde_json::json!(i),
            Ok(ValueRef::UInt(i)) => serde_json::json!(i),
            Ok(ValueRef::UBigInt(i)) => serde_json::json!(i),
            Ok(ValueRef::Float(f)) => serde_json::json!(f),
            Ok(ValueRef::Double(f)) => serde_json::json!(f),
            Ok(ValueRef::Decimal(d)) => {
                // JSON numbers where they fit, text for very large decimals
                let s = d.to_string();
                match s.parse::<f64>() {
                    Ok(f) => serde_json::json!(f),
                    Err(_) => serde_json::Value::String(s),
                }
            }
            Ok(ValueRef::Text(bytes)) => {
                serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
            }
            Ok(ValueRef::Blob(bytes)) => {
                serde_json::Value::String(format!("<blob {} bytes>", bytes.len()))
            }
            Ok(ValueRef::Date32(d)) => {
                // Days since epoch
                let date = chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
                    .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(d as i64)));
                match date {
                    Some(date) => serde_json::Value::String(date.to_string()),
                    None => serde_json::json!(d),
                }
            }
            Ok(ValueRef::Timestamp(_, ts)) => {
                // Microseconds since epoch
                let dt = chrono::DateTime::from_timestamp_micros(ts)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| ts.to_string());
                serde_json::Value::String(dt)
            }
            Ok(ValueRef::Time64(_, t)) => serde_json::json!(t),
            Ok(ValueRef::Interval {
                months,
                days,
                nanos,
            }) => serde_json::json!({
                "months": months,
                "days": days,
                "nanos": nanos
            }),
            _ => serde_json::Value::Null,
        }
    }
}

impl DbConnection for DuckDbConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Standard
    }

    fn execute(&self, sql: &str) -> Result<u64> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let affected = conn.execute(sql, []).map_err(execution_error)?;
        Ok(affected as u64)
    }

    fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql).map_err(execution_error)?;
        let mut result_rows = stmt.query([]).map_err(execution_error)?;

        let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();
        let mut column_count = 0;

        while let Some(row) = result_rows.next().map_err(execution_error)? {
            // Get column count from the first row
            if rows.is_empty() {
                column_count = row.as_ref().column_count();
            }

            let row_values = (0..column_count)
                .map(|i| Self::get_column_value(row, i))
                .collect();
            rows.push(row_values);
        }

        // Drop result_rows to release borrow on stmt
        drop(result_rows);

        if column_count == 0 {
            column_count = stmt.column_count();
        }
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        Ok(QueryResult::new(columns, rows))
    }

    fn close(&self) -> Result<()> {
        let mut guard = self.lock()?;
        match guard.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| Error::connection(e.to_string()))?;
                debug!("closed duckdb connection");
                Ok(())
            }
            None => Err(Error::Closed),
        }
    }
}
