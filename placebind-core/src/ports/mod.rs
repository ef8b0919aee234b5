//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on a concrete database driver.

mod connection;

pub use connection::{DbConnection, QueryResult, Row};
