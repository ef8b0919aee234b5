//! SQL string-literal conventions
//!
//! A dialect decides two things that must agree with each other: how the
//! literal scanner recognises an escaped delimiter, and how a value is turned
//! into a quoted literal. Quoting with one dialect and scanning with another
//! is how injection bugs happen, so both live on the same type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Backslash escapes the next character inside a literal (MySQL, MariaDB)
    #[default]
    MySql,
    /// Backslash is ordinary; a delimiter is escaped by doubling it (ANSI, DuckDB)
    Standard,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Standard => "standard",
        }
    }

    pub(crate) fn backslash_escapes(&self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Escape and quote a value as a SQL literal.
    ///
    /// `Null` becomes the bare keyword `null`. Text is always quoted and
    /// escaped. Numbers are emitted unquoted, with negatives parenthesised so
    /// that `a - ?` cannot turn into a `--` comment.
    pub fn quote(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Text(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('\'');
                self.escape_into(s, &mut out);
                out.push('\'');
                out
            }
            Value::Number(n) if n.is_zero() => "0".to_string(),
            Value::Number(n) if n.is_sign_negative() => format!("({})", n),
            Value::Number(n) => n.to_string(),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
        }
    }

    /// Escape raw text for use between single quotes
    pub fn escape(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        self.escape_into(raw, &mut out);
        out
    }

    fn escape_into(&self, raw: &str, out: &mut String) {
        match self {
            // Same character set as mysql_real_escape_string
            Dialect::MySql => {
                for c in raw.chars() {
                    match c {
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\x1a' => out.push_str("\\Z"),
                        c => out.push(c),
                    }
                }
            }
            Dialect::Standard => {
                for c in raw.chars() {
                    if c == '\'' {
                        out.push('\'');
                    }
                    out.push(c);
                }
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "standard" | "ansi" | "duckdb" => Ok(Dialect::Standard),
            other => Err(Error::Config(format!("unknown dialect: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_null_is_bare_keyword() {
        assert_eq!(Dialect::MySql.quote(&Value::Null), "null");
        assert_eq!(Dialect::Standard.quote(&Value::Null), "null");
    }

    #[test]
    fn test_empty_text_is_quoted() {
        assert_eq!(Dialect::MySql.quote(&Value::from("")), "''");
    }

    #[test]
    fn test_mysql_escapes_quotes_and_backslashes() {
        assert_eq!(Dialect::MySql.quote(&Value::from("O'Brien")), "'O\\'Brien'");
        assert_eq!(Dialect::MySql.quote(&Value::from("a\\b")), "'a\\\\b'");
        assert_eq!(Dialect::MySql.quote(&Value::from("say \"hi\"")), "'say \\\"hi\\\"'");
    }

    #[test]
    fn test_mysql_escapes_control_characters() {
        assert_eq!(Dialect::MySql.escape("a\nb\r\0\x1a"), "a\\nb\\r\\0\\Z");
    }

    #[test]
    fn test_standard_doubles_single_quotes_only() {
        assert_eq!(Dialect::Standard.quote(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(Dialect::Standard.quote(&Value::from("a\\b\"c")), "'a\\b\"c'");
    }

    #[test]
    fn test_numbers_and_booleans() {
        assert_eq!(Dialect::MySql.quote(&Value::from(5)), "5");
        assert_eq!(Dialect::MySql.quote(&Value::from(-3)), "(-3)");
        assert_eq!(Dialect::MySql.quote(&Value::from(0)), "0");
        assert_eq!(Dialect::MySql.quote(&Value::Number(Decimal::new(-125, 2))), "(-1.25)");
        assert_eq!(Dialect::MySql.quote(&Value::from(true)), "TRUE");
        assert_eq!(Dialect::Standard.quote(&Value::from(false)), "FALSE");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("duckdb".parse::<Dialect>().unwrap(), Dialect::Standard);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
