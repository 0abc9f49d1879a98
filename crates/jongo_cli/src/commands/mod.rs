//! CLI command implementations.

pub mod count;
pub mod get;
pub mod list;
pub mod query;
pub mod write;

use crate::error::{CliError, CliResult};
use clap::ValueEnum;
use jongo_client::{
    Endpoint, Entity, HttpConfig, HttpTransport, Proxy, ReqwestClient, Schema, Value,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Output format of read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per row.
    Text,
    /// A JSON document.
    Json,
}

/// Connection settings shared by every command.
#[derive(Debug, Clone)]
pub struct Connection {
    pub server: String,
    pub root: String,
    pub database: String,
    pub table: Option<String>,
    pub id_column: String,
    pub fields: Vec<String>,
    pub timeout: u64,
}

impl Connection {
    fn schema(&self, table: &str) -> Schema {
        Schema::new(table)
            .with_identity_field(self.id_column.clone())
            .fields(self.fields.iter().map(String::as_str))
    }

    fn http_config(&self) -> HttpConfig {
        match self.timeout {
            0 => HttpConfig::new().without_timeout(),
            secs => HttpConfig::new().with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Builds a proxy for the selected table over HTTP.
    pub fn proxy(&self) -> CliResult<Proxy> {
        let table = self.table.as_deref().ok_or(CliError::MissingTable)?;
        let endpoint = Endpoint::new(self.server.clone(), self.database.clone(), table)
            .with_root(self.root.clone());
        let transport = HttpTransport::new(ReqwestClient::new(self.http_config())?);
        Ok(Proxy::new(endpoint, self.schema(table), Arc::new(transport)))
    }
}

/// Splits `column=value` and parses the value as a literal.
pub fn parse_assignment(input: &str) -> CliResult<(String, Value)> {
    match input.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), Value::parse_literal(value)))
        }
        _ => Err(CliError::InvalidAssignment(input.to_string())),
    }
}

/// Prints rows in the selected format.
pub fn print_entities(
    entities: &[Entity],
    format: OutputFormat,
    out: &mut dyn Write,
) -> CliResult<()> {
    match format {
        OutputFormat::Text => {
            for entity in entities {
                writeln!(out, "{}", entity)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(entities)?)?;
        }
    }
    Ok(())
}
