//! CLI command implementations

pub mod exec;
pub mod query;
pub mod render;

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use placebind_core::{PlacebindContext, Value};

use crate::StatementArgs;

/// Get the placebind directory from environment or default
pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PLACEBIND_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".placebind"))
        .context("Could not find home directory; set PLACEBIND_DIR")
}

/// Load config and connect
pub fn get_context() -> Result<PlacebindContext> {
    let config_dir = get_config_dir()?;

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

    PlacebindContext::new(&config_dir).context("Failed to initialize placebind context")
}

/// SQL from: argument, file, or stdin
pub fn read_sql(statement: &StatementArgs) -> Result<String> {
    if let Some(sql) = &statement.sql {
        Ok(sql.clone())
    } else if let Some(file_path) = &statement.file {
        std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read SQL file: {:?}", file_path))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read SQL from stdin")?;
        Ok(buffer)
    } else {
        anyhow::bail!("No SQL provided. Use positional argument, --file, or pipe from stdin.");
    }
}

/// Placeholder arguments from repeated `--arg` or one `--args` array
pub fn read_arguments(statement: &StatementArgs) -> Result<Vec<Value>> {
    if let Some(json) = &statement.args_json {
        let items: Vec<serde_json::Value> =
            serde_json::from_str(json).context("--args must be a JSON array")?;
        return items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Value::try_from(item).with_context(|| format!("Invalid argument #{}", i + 1))
            })
            .collect();
    }

    statement
        .args
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            Value::parse_arg(raw).with_context(|| format!("Invalid argument #{}", i + 1))
        })
        .collect()
}
