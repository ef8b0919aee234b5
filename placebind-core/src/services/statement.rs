//! Statement service - parameterized SQL execution
//!
//! Renders `?` templates against a connection's quoting rules and hands the
//! result to the connection. This is the only path by which caller values
//! reach the database, and every value goes through `escape_and_quote`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{scan_literals, substitute_scanned, Substitution, Value};
use crate::ports::{DbConnection, QueryResult};

/// Parameterized statement execution over a [`DbConnection`]
pub struct StatementService {
    connection: Arc<dyn DbConnection>,
    strict_literals: bool,
}

impl StatementService {
    pub fn new(connection: Arc<dyn DbConnection>) -> Self {
        Self {
            connection,
            strict_literals: false,
        }
    }

    /// Fail on unterminated literals instead of logging a warning
    pub fn with_strict_literals(mut self, strict: bool) -> Self {
        self.strict_literals = strict;
        self
    }

    pub fn connection(&self) -> &Arc<dyn DbConnection> {
        &self.connection
    }

    /// Substitute `arguments` into `template` without executing it
    pub fn render(&self, template: &str, arguments: &[Value]) -> Result<Substitution> {
        let dialect = self.connection.dialect();
        let scan = scan_literals(template, dialect);

        if let Some(first) = scan.malformed.first() {
            if self.strict_literals {
                return Err(Error::MalformedLiteral {
                    offset: first.offset,
                    delimiter: first.delimiter,
                });
            }
            for m in &scan.malformed {
                warn!(
                    offset = m.offset,
                    delimiter = %m.delimiter,
                    "unterminated literal in SQL template"
                );
            }
        }

        let connection = &self.connection;
        let substitution = substitute_scanned(template, &scan, arguments, |value| {
            connection.escape_and_quote(value)
        });
        debug!(
            %dialect,
            placeholders = substitution.placeholders,
            bound = substitution.bound,
            arguments = arguments.len(),
            "rendered statement"
        );
        Ok(substitution)
    }

    /// Execute a statement and return the number of affected rows
    pub fn exec(&self, template: &str, arguments: &[Value]) -> Result<u64> {
        let rendered = self.render(template, arguments)?;
        self.connection.execute(&rendered.sql)
    }

    /// Execute a statement and fetch every row
    pub fn fetch_rows(&self, template: &str, arguments: &[Value]) -> Result<QueryResult> {
        let rendered = self.render(template, arguments)?;
        self.connection.execute_query(&rendered.sql)
    }

    /// Prepare a deferred row source; nothing is executed until
    /// [`RowSource::rows`] is called
    pub fn query(&self, template: &str, arguments: &[Value]) -> Result<RowSource> {
        let rendered = self.render(template, arguments)?;
        Ok(RowSource {
            connection: Arc::clone(&self.connection),
            sql: rendered.sql,
        })
    }

    /// Escape and quote a single value for this connection
    pub fn quote(&self, value: &Value) -> String {
        self.connection.escape_and_quote(value)
    }

    pub fn close(&self) -> Result<()> {
        self.connection.close()
    }
}

/// Rendered statement bound to its connection
pub struct RowSource {
    connection: Arc<dyn DbConnection>,
    sql: String,
}

impl RowSource {
    /// The SQL that will be sent
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute and fetch rows. Each call runs the statement again.
    pub fn rows(&self) -> Result<QueryResult> {
        self.connection.execute_query(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::domain::Dialect;

    /// Records every statement it is asked to run
    struct RecordingConnection {
        dialect: Dialect,
        executed: Mutex<Vec<String>>,
    }

    impl RecordingConnection {
        fn new(dialect: Dialect) -> Arc<Self> {
            Arc::new(Self {
                dialect,
                executed: Mutex::new(Vec::new()),
            })
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    impl DbConnection for RecordingConnection {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        fn execute(&self, sql: &str) -> Result<u64> {
            self.executed.lock().unwrap().push(sql.to_string());
            Ok(1)
        }

        fn execute_query(&self, sql: &str) -> Result<QueryResult> {
            self.executed.lock().unwrap().push(sql.to_string());
            Ok(QueryResult::new(
                vec!["sql".to_string()],
                vec![vec![serde_json::json!(sql)]],
            ))
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_exec_sends_substituted_sql() {
        let conn = RecordingConnection::new(Dialect::MySql);
        let service = StatementService::new(conn.clone());

        let affected = service
            .exec(
                "UPDATE users SET name = ? WHERE note = 'why?' AND id = ?",
                &[Value::from("O'Brien"), Value::from(3)],
            )
            .unwrap();

        assert_eq!(affected, 1);
        assert_eq!(
            conn.executed(),
            vec!["UPDATE users SET name = 'O\\'Brien' WHERE note = 'why?' AND id = 3"]
        );
    }

    #[test]
    fn test_quoting_follows_connection_dialect() {
        let conn = RecordingConnection::new(Dialect::Standard);
        let service = StatementService::new(conn.clone());

        service.exec("INSERT INTO t VALUES (?)", &[Value::from("it's")]).unwrap();
        assert_eq!(conn.executed(), vec!["INSERT INTO t VALUES ('it''s')"]);
        assert_eq!(service.quote(&Value::Null), "null");
    }

    #[test]
    fn test_query_is_deferred_until_rows() {
        let conn = RecordingConnection::new(Dialect::MySql);
        let service = StatementService::new(conn.clone());

        let source = service.query("SELECT * FROM t WHERE id = ?", &[Value::from(9)]).unwrap();
        assert_eq!(source.sql(), "SELECT * FROM t WHERE id = 9");
        assert!(conn.executed().is_empty());

        source.rows().unwrap();
        source.rows().unwrap();
        assert_eq!(conn.executed().len(), 2);
    }

    #[test]
    fn test_malformed_literal_warns_by_default() {
        let conn = RecordingConnection::new(Dialect::MySql);
        let service = StatementService::new(conn.clone());

        let rendered = service.render("SELECT 'oops, ?", &[Value::from(1)]).unwrap();
        assert_eq!(rendered.sql, "SELECT 'oops, 1");
        assert_eq!(rendered.malformed.len(), 1);
    }

    #[test]
    fn test_strict_literals_rejects_before_execution() {
        let conn = RecordingConnection::new(Dialect::MySql);
        let service = StatementService::new(conn.clone()).with_strict_literals(true);

        let err = service.exec("SELECT 'oops, ?", &[Value::from(1)]).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedLiteral {
                offset: 7,
                delimiter: '\''
            }
        ));
        assert!(conn.executed().is_empty());
    }

    #[test]
    fn test_fetch_rows_returns_connection_rows() {
        let conn = RecordingConnection::new(Dialect::MySql);
        let service = StatementService::new(conn);

        let result = service.fetch_rows("SELECT ?", &[Value::from(true)]).unwrap();
        assert_eq!(result.rows[0][0], serde_json::json!("SELECT TRUE"));
    }
}
