//! placebind core - positional `?` parameters for SQL connections
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: literal scanning, placeholder substitution, value quoting
//! - **ports**: the `DbConnection` trait a database driver must provide
//! - **services**: the statement service that renders and executes templates
//! - **adapters**: concrete connections (DuckDB, MySQL)
//!
//! ```
//! use placebind_core::{substitute, Value};
//!
//! let sql = substitute(
//!     "SELECT * FROM t WHERE note = 'what?' AND id = ?",
//!     &[Value::from(5)],
//! );
//! assert_eq!(sql, "SELECT * FROM t WHERE note = 'what?' AND id = 5");
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::duckdb::DuckDbConnection;
use adapters::mysql::MySqlConnection;
use config::{Backend, Config};
use services::StatementService;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{substitute, substitute_with, Dialect, Substitution, Value};
pub use ports::{DbConnection, QueryResult, Row};
pub use services::RowSource;

/// Open the connection described by `config`
pub fn open_connection(config: &Config) -> Result<Arc<dyn DbConnection>> {
    let connection: Arc<dyn DbConnection> = match config.backend {
        Backend::DuckDb => Arc::new(DuckDbConnection::open(&config.duckdb_path())?),
        Backend::MySql => Arc::new(MySqlConnection::connect(&config.mysql)?),
    };
    Ok(connection)
}

/// Main context for placebind operations
///
/// Holds the loaded configuration and a statement service bound to the
/// configured connection.
pub struct PlacebindContext {
    pub config: Config,
    pub statement_service: StatementService,
}

impl PlacebindContext {
    /// Load config from `config_dir` and connect
    pub fn new(config_dir: &Path) -> Result<Self> {
        let config = Config::load(config_dir)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let connection = open_connection(&config)?;
        let statement_service =
            StatementService::new(connection).with_strict_literals(config.strict_literals);

        Ok(Self {
            config,
            statement_service,
        })
    }
}
