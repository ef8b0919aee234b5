//! placebind CLI - run parameterized SQL from your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{exec, query, render};

/// placebind - positional `?` parameters for SQL
#[derive(Parser)]
#[command(name = "placebind", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the statement and its arguments come from
#[derive(Args)]
pub struct StatementArgs {
    /// SQL template with `?` placeholders
    pub sql: Option<String>,
    /// Read the SQL template from file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Argument for the next placeholder (JSON scalar, or plain text)
    #[arg(short, long = "arg", value_name = "VALUE")]
    pub args: Vec<String>,
    /// All arguments as one JSON array, used instead of --arg
    #[arg(long = "args", value_name = "JSON", conflicts_with = "args")]
    pub args_json: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a statement and print the number of affected rows
    Exec {
        #[command(flatten)]
        statement: StatementArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute a query and print its rows
    Query {
        #[command(flatten)]
        statement: StatementArgs,
        /// Output format
        #[arg(long, default_value = "table")]
        format: String,
        /// Output as JSON (shorthand for --format json)
        #[arg(long)]
        json: bool,
    },

    /// Print the substituted SQL without connecting
    Render {
        #[command(flatten)]
        statement: StatementArgs,
        /// Quoting rules: mysql or standard
        #[arg(long, default_value = "mysql")]
        dialect: String,
        /// Fail on unterminated literals
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Exec { statement, json } => exec::run(&statement, json),
        Commands::Query { statement, format, json } => {
            let fmt = if json { "json".to_string() } else { format };
            query::run(&statement, &fmt)
        }
        Commands::Render {
            statement,
            dialect,
            strict,
        } => render::run(&statement, &dialect, strict),
    }
}
