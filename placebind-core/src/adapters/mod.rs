//! Adapter implementations
//!
//! Adapters implement the `DbConnection` port with concrete drivers:
//! - DuckDB (embedded, file or in-memory)
//! - MySQL over sqlx

pub mod duckdb;
pub mod mysql;
