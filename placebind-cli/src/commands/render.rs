//! Render command - show the substituted SQL without a database

use anyhow::{Context, Result};
use placebind_core::{substitute_with, Dialect, Error};

use super::{read_arguments, read_sql};
use crate::output;
use crate::StatementArgs;

pub fn run(statement: &StatementArgs, dialect: &str, strict: bool) -> Result<()> {
    let dialect: Dialect = dialect.parse().context("Invalid --dialect")?;
    let sql = read_sql(statement)?;
    let arguments = read_arguments(statement)?;

    let rendered = substitute_with(&sql, &arguments, dialect);

    for m in &rendered.malformed {
        if strict {
            return Err(Error::MalformedLiteral {
                offset: m.offset,
                delimiter: m.delimiter,
            }
            .into());
        }
        output::warning(&format!(
            "Unterminated {} literal at byte {}",
            m.delimiter, m.offset
        ));
    }
    if rendered.unbound() > 0 {
        output::warning(&format!(
            "{} placeholder(s) left unbound",
            rendered.unbound()
        ));
    }

    println!("{}", rendered.sql);
    Ok(())
}
