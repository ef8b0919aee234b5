//! Configuration management
//!
//! Settings live in `settings.json` inside the config directory:
//! ```json
//! {
//!   "backend": "duckdb",
//!   "duckdb": { "path": "data.duckdb" },
//!   "mysql": { "database": "shop", "username": "app", "server": "localhost" },
//!   "strictLiterals": false
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapters::mysql::MySqlSettings;
use crate::domain::result::{Error, Result};

/// Which adapter to connect through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    DuckDb,
    MySql,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::DuckDb => f.write_str("duckdb"),
            Backend::MySql => f.write_str("mysql"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(Backend::DuckDb),
            "mysql" | "mariadb" => Ok(Backend::MySql),
            other => Err(Error::Config(format!("unknown backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuckDbSettings {
    /// Relative paths resolve against the config directory
    #[serde(default = "default_duckdb_path")]
    pub path: String,
}

fn default_duckdb_path() -> String {
    "placebind.duckdb".to_string()
}

impl Default for DuckDbSettings {
    fn default() -> Self {
        Self {
            path: default_duckdb_path(),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    backend: Backend,
    #[serde(default)]
    duckdb: DuckDbSettings,
    #[serde(default)]
    mysql: MySqlSettings,
    #[serde(default)]
    strict_literals: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// placebind configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub backend: Backend,
    pub duckdb: DuckDbSettings,
    pub mysql: MySqlSettings,
    /// Reject templates with unterminated literals instead of warning
    pub strict_literals: bool,
    config_dir: PathBuf,
    // Keys we don't manage, preserved on save
    other: HashMap<String, serde_json::Value>,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load config from a directory
    ///
    /// A missing settings file yields defaults. Environment variables
    /// override the file:
    /// - `PLACEBIND_BACKEND`: `duckdb` or `mysql`
    /// - `PLACEBIND_DATABASE`: DuckDB path (or `:memory:`) / MySQL database name
    /// - `PLACEBIND_STRICT_LITERALS`: `true/1/yes` or `false/0/no`
    pub fn load(config_dir: &Path) -> Result<Self> {
        Self::load_with_env(config_dir, |key| std::env::var(key).ok())
    }

    fn load_with_env<F>(config_dir: &Path, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_path = config_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", settings_path.display(), e)))?
        } else {
            SettingsFile::default()
        };

        let mut config = Self {
            backend: raw.backend,
            duckdb: raw.duckdb,
            mysql: raw.mysql,
            strict_literals: raw.strict_literals,
            config_dir: config_dir.to_path_buf(),
            other: raw.other,
        };
        config.apply_env(var)?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = var("PLACEBIND_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(database) = var("PLACEBIND_DATABASE") {
            match self.backend {
                Backend::DuckDb => self.duckdb.path = database,
                Backend::MySql => self.mysql.database = database,
            }
        }
        if let Some(strict) = var("PLACEBIND_STRICT_LITERALS").as_deref().and_then(parse_flag) {
            self.strict_literals = strict;
        }
        Ok(())
    }

    /// Save config, preserving settings this crate doesn't manage
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let settings = SettingsFile {
            backend: self.backend,
            duckdb: self.duckdb.clone(),
            mysql: self.mysql.clone(),
            strict_literals: self.strict_literals,
            other: self.other.clone(),
        };

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(config_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// DuckDB file path, resolved against the config directory
    pub fn duckdb_path(&self) -> PathBuf {
        let path = Path::new(&self.duckdb.path);
        if path.is_absolute() || self.duckdb.path == crate::adapters::duckdb::IN_MEMORY {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_with_env(dir.path(), |_| None).unwrap();
        assert_eq!(config.backend, Backend::DuckDb);
        assert_eq!(config.duckdb_path(), dir.path().join("placebind.duckdb"));
        assert!(!config.strict_literals);
    }

    #[test]
    fn test_load_and_save_preserves_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"backend": "mysql", "mysql": {"database": "shop"}, "theme": "dark"}"#,
        )
        .unwrap();

        let mut config = Config::load_with_env(dir.path(), |_| None).unwrap();
        assert_eq!(config.backend, Backend::MySql);
        config.strict_literals = true;
        config.save(dir.path()).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["strictLiterals"], true);
        assert_eq!(saved["mysql"]["server"], "localhost");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        assert!(matches!(
            Config::load_with_env(dir.path(), |_| None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            ("PLACEBIND_BACKEND", "mysql"),
            ("PLACEBIND_DATABASE", "shop"),
            ("PLACEBIND_STRICT_LITERALS", "yes"),
        ]
        .into_iter()
        .collect();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.backend, Backend::MySql);
        assert_eq!(config.mysql.database, "shop");
        assert!(config.strict_literals);
    }

    #[test]
    fn test_env_rejects_unknown_backend() {
        let mut config = Config::default();
        let result =
            config.apply_env(|key| (key == "PLACEBIND_BACKEND").then(|| "oracle".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_duckdb_path_resolution() {
        let mut config = Config {
            config_dir: PathBuf::from("/etc/placebind"),
            ..Config::default()
        };
        assert_eq!(config.duckdb_path(), PathBuf::from("/etc/placebind/placebind.duckdb"));

        config.duckdb.path = ":memory:".to_string();
        assert_eq!(config.duckdb_path(), PathBuf::from(":memory:"));

        config.duckdb.path = "/var/db/app.duckdb".to_string();
        assert_eq!(config.duckdb_path(), PathBuf::from("/var/db/app.duckdb"));
    }
}
