//! MySQL connection adapter
//!
//! Wraps a single sqlx connection. The driver is async, so the adapter owns a
//! current-thread tokio runtime and blocks on it, which keeps the
//! [`DbConnection`] port synchronous.
//!
//! Statements arrive fully rendered and go over the text protocol
//! (`COM_QUERY`). A leftover `?` is plain text to the server, never a
//! prepared-statement parameter.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::Dialect;
use crate::ports::{DbConnection, QueryResult};

type SqlxConnection = sqlx::mysql::MySqlConnection;

/// Connection settings for a MySQL server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MySqlSettings {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_charset")]
    pub charset: String,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            database: String::new(),
            username: String::new(),
            password: String::new(),
            server: default_server(),
            port: default_port(),
            charset: default_charset(),
        }
    }
}

impl MySqlSettings {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.server)
            .port(self.port)
            .charset(&self.charset);
        if !self.username.is_empty() {
            options = options.username(&self.username);
        }
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        options
    }
}

/// `(number) message` for server errors, falling back to SQLSTATE
fn server_code(db: &dyn sqlx::error::DatabaseError) -> Option<String> {
    db.try_downcast_ref::<MySqlDatabaseError>()
        .map(|e| e.number().to_string())
        .or_else(|| db.code().map(|c| c.into_owned()))
}

fn execution_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(db) => Error::execution(server_code(&*db), db.message()),
        other => Error::execution(None, other.to_string()),
    }
}

fn connection_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(db) => match server_code(&*db) {
            Some(code) => Error::connection(format!("{} (Error no. {})", db.message(), code)),
            None => Error::connection(db.message()),
        },
        other => Error::connection(format!("Failed to connect to the database: {}", other)),
    }
}

fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

/// MySQL connection
pub struct MySqlConnection {
    runtime: Runtime,
    conn: Mutex<Option<SqlxConnection>>,
}

impl MySqlConnection {
    /// Connect and select the configured database
    pub fn connect(settings: &MySqlSettings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;

        let options = settings.connect_options();
        let conn = runtime
            .block_on(SqlxConnection::connect_with(&options))
            .map_err(connection_error)?;
        debug!(
            server = %settings.server,
            port = settings.port,
            database = %settings.database,
            "connected to mysql"
        );

        Ok(Self {
            runtime,
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<SqlxConnection>>> {
        self.conn
            .lock()
            .map_err(|_| Error::connection("connection lock poisoned"))
    }

    /// Column names for a query that returned no rows.
    ///
    /// The text protocol only hands back column metadata alongside rows, so
    /// this asks the server to prepare the statement and reads the names off
    /// it. Statements that cannot be prepared report no columns.
    fn describe_columns(&self, conn: &mut SqlxConnection, sql: &str) -> Vec<String> {
        match self.runtime.block_on((&mut *conn).prepare(sql)) {
            Ok(statement) => column_names(statement.columns()),
            Err(e) => {
                debug!(error = %e, "could not describe empty result");
                Vec::new()
            }
        }
    }

    fn column_value(row: &MySqlRow, idx: usize) -> serde_json::Value {
        use chrono::{NaiveDate, NaiveDateTime};
        use rust_decimal::Decimal;
        use serde_json::Value;

        // TINYINT(1) also decodes as an integer, so check it first.
        let type_name = row.columns().get(idx).map(|c| c.type_info().name());
        if type_name == Some("BOOLEAN") {
            if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
                return v.map(Value::Bool).unwrap_or(Value::Null);
            }
        }

        // NULL decodes as Ok(None) for any Option<T>, so the first probe
        // settles it. Otherwise try the types MySQL columns commonly map to.
        row.try_get::<Option<i64>, _>(idx)
            .map(|v| v.map(Value::from))
            .or_else(|_| row.try_get::<Option<u64>, _>(idx).map(|v| v.map(Value::from)))
            .or_else(|_| row.try_get::<Option<f64>, _>(idx).map(|v| v.map(Value::from)))
            .or_else(|_| {
                row.try_get::<Option<Decimal>, _>(idx).map(|v| {
                    v.map(|d| {
                        let s = d.to_string();
                        s.parse::<f64>().map(Value::from).unwrap_or(Value::String(s))
                    })
                })
            })
            .or_else(|_| row.try_get::<Option<String>, _>(idx).map(|v| v.map(Value::String)))
            .or_else(|_| {
                row.try_get::<Option<NaiveDateTime>, _>(idx)
                    .map(|v| v.map(|dt| Value::String(dt.to_string())))
            })
            .or_else(|_| {
                row.try_get::<Option<NaiveDate>, _>(idx)
                    .map(|v| v.map(|d| Value::String(d.to_string())))
            })
            .or_else(|_| {
                row.try_get::<Option<Vec<u8>>, _>(idx)
                    .map(|v| v.map(|b| Value::String(format!("<blob {} bytes>", b.len()))))
            })
            .ok()
            .flatten()
            .unwrap_or(Value::Null)
    }
}

impl DbConnection for MySqlConnection {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn execute(&self, sql: &str) -> Result<u64> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(Error::Closed)?;
        let done = self
            .runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut *conn))
            .map_err(execution_error)?;
        Ok(done.rows_affected())
    }

    fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(Error::Closed)?;
        let rows = self
            .runtime
            .block_on(sqlx::raw_sql(sql).fetch_all(&mut *conn))
            .map_err(execution_error)?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => column_names(row.columns()),
            None => self.describe_columns(conn, sql),
        };
        let values = rows
            .iter()
            .map(|row| (0..columns.len()).map(|i| Self::column_value(row, i)).collect())
            .collect();

        Ok(QueryResult::new(columns, values))
    }

    fn close(&self) -> Result<()> {
        let mut guard = self.lock()?;
        let conn = guard.take().ok_or(Error::Closed)?;
        self.runtime
            .block_on(conn.close())
            .map_err(|e| Error::connection(e.to_string()))?;
        debug!("closed mysql connection");
        Ok(())
    }
}
