//! Count command implementation.

use super::OutputFormat;
use crate::error::CliResult;
use jongo_client::Proxy;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct CountOutput<'a> {
    table: &'a str,
    count: u64,
}

/// Prints the number of rows in the table.
pub fn run(proxy: &Proxy, format: OutputFormat, out: &mut dyn Write) -> CliResult<()> {
    let count = proxy.count()?;
    match format {
        OutputFormat::Text => writeln!(out, "{}", count)?,
        OutputFormat::Json => {
            let output = CountOutput {
                table: &proxy.endpoint().table,
                count,
            };
            writeln!(out, "{}", serde_json::to_string(&output)?)?;
        }
    }
    Ok(())
}
