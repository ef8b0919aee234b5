//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// The server rejected a statement. `code` is the server's error code
    /// (SQLSTATE for MySQL) when the driver reports one.
    #[error("Failed to execute the statement: {}", format_execution(.code, .message))]
    Execution {
        code: Option<String>,
        message: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection is closed")]
    Closed,

    /// Only raised when strict literal checking is enabled
    #[error("Unterminated {delimiter} literal starting at byte {offset}")]
    MalformedLiteral { offset: usize, delimiter: char },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_execution(code: &Option<String>, message: &str) -> String {
    match code {
        Some(code) => format!("({}) {}", code, message),
        None => message.to_string(),
    }
}

impl Error {
    /// Create an execution error
    pub fn execution(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            code,
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Server error code, if this is an execution error that carries one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Execution { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_message_with_code() {
        let err = Error::execution(Some("42S02".to_string()), "Table 'x' doesn't exist");
        assert_eq!(
            err.to_string(),
            "Failed to execute the statement: (42S02) Table 'x' doesn't exist"
        );
        assert_eq!(err.code(), Some("42S02"));
    }

    #[test]
    fn test_execution_message_without_code() {
        let err = Error::execution(None, "syntax error");
        assert_eq!(err.to_string(), "Failed to execute the statement: syntax error");
        assert!(err.code().is_none());
    }

    #[test]
    fn test_malformed_literal_message() {
        let err = Error::MalformedLiteral {
            offset: 7,
            delimiter: '\'',
        };
        assert!(err.to_string().contains("byte 7"));
        assert!(err.code().is_none());
    }
}
