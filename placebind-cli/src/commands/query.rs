//! Query command - execute a parameterized query and print rows

use anyhow::Result;

use super::{get_context, read_arguments, read_sql};
use crate::output;
use crate::StatementArgs;

pub fn run(statement: &StatementArgs, format: &str) -> Result<()> {
    let sql = read_sql(statement)?;
    let arguments = read_arguments(statement)?;

    let ctx = get_context()?;
    let result = ctx.statement_service.fetch_rows(&sql, &arguments)?;
    ctx.statement_service.close()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "csv" => {
            println!("{}", result.columns.join(","));
            for row in &result {
                let values: Vec<String> = row.values().iter().map(value_to_csv).collect();
                println!("{}", values.join(","));
            }
        }
        _ => {
            let mut table = output::create_table();
            table.set_header(&result.columns);

            for row in &result {
                let values: Vec<String> = row.values().iter().map(value_to_string).collect();
                table.add_row(values);
            }

            println!("{}", table);
            println!();
            println!("{} row(s) returned", result.row_count);
        }
    }

    Ok(())
}

fn value_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => v.to_string(),
    }
}

fn value_to_csv(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "".to_string(),
        serde_json::Value::String(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.clone()
            }
        }
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => v.to_string(),
    }
}
