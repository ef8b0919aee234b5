//! Connection port - database abstraction

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Dialect, Value};

/// A live database connection
///
/// Implementations (adapters) execute fully rendered SQL. Placeholder
/// substitution happens before the SQL reaches this trait.
pub trait DbConnection: Send + Sync {
    /// String-literal conventions of the server behind this connection
    fn dialect(&self) -> Dialect;

    /// Execute a statement, returning the number of affected rows
    fn execute(&self, sql: &str) -> Result<u64>;

    /// Execute a statement that produces rows
    fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Escape and quote a value as a literal for this server
    fn escape_and_quote(&self, value: &Value) -> String {
        self.dialect().quote(value)
    }

    /// Close the connection. Later calls fail with `Error::Closed`.
    fn close(&self) -> Result<()>;
}

/// Result of a SQL query
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in fetch order
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = Row<'a>;
    type IntoIter = Box<dyn Iterator<Item = Row<'a>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// One fetched row, addressable by index or column name
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [serde_json::Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, idx: usize) -> Option<&'a serde_json::Value> {
        self.values.get(idx)
    }

    /// First column with this name
    pub fn get_by_name(&self, name: &str) -> Option<&'a serde_json::Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    pub fn values(&self) -> &'a [serde_json::Value] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
