//! Get command implementation.

use super::{print_entities, OutputFormat};
use crate::error::CliResult;
use jongo_client::{Proxy, Value};
use std::io::Write;

/// Runs the get command.
pub fn run(proxy: &Proxy, id: &str, format: OutputFormat, out: &mut dyn Write) -> CliResult<()> {
    let entity = proxy.read(&Value::parse_literal(id))?;
    print_entities(std::slice::from_ref(&entity), format, out)
}
