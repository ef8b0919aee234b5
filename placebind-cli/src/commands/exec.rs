//! Exec command - run a statement and report affected rows

use anyhow::Result;

use super::{get_context, read_arguments, read_sql};
use crate::output;
use crate::StatementArgs;

pub fn run(statement: &StatementArgs, json: bool) -> Result<()> {
    let sql = read_sql(statement)?;
    let arguments = read_arguments(statement)?;

    let ctx = get_context()?;
    let affected = ctx.statement_service.exec(&sql, &arguments)?;
    ctx.statement_service.close()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "affected_rows": affected }))?
        );
    } else {
        output::success(&format!("{} row(s) affected", affected));
    }

    Ok(())
}
