//! List command implementation.

use super::{print_entities, OutputFormat};
use crate::error::CliResult;
use jongo_client::{Direction, DynamicFinder, Entity, Page, Proxy, Sort, Value};
use serde::Serialize;
use std::io::Write;

/// Options of the list command.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Page index.
    pub page: i64,
    /// Rows per page.
    pub size: u32,
    /// Sort column and direction.
    pub sort: Option<(String, Direction)>,
    /// Dynamic finder name.
    pub finder: Option<String>,
    /// Finder arguments.
    pub args: Vec<String>,
}

/// JSON output of the list command.
#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    page: i64,
    count: Option<u64>,
    rows: &'a [Entity],
}

/// Runs the list command.
pub fn run(
    proxy: &Proxy,
    options: &ListOptions,
    format: OutputFormat,
    out: &mut dyn Write,
) -> CliResult<()> {
    proxy.set_page(Page::new(options.size).at(options.page));
    proxy.set_sort(
        options
            .sort
            .as_ref()
            .map(|(column, dir)| Sort::new(column.clone(), *dir)),
    );

    let finder = options.finder.as_ref().map(|name| {
        DynamicFinder::new(
            name.clone(),
            options.args.iter().map(|a| Value::parse_literal(a)),
        )
    });
    let listing = proxy.read_all(finder.as_ref())?;

    match format {
        OutputFormat::Text => {
            print_entities(&listing.entities, format, out)?;
            if let Some(count) = listing.count {
                writeln!(out, "({} rows)", count)?;
            }
        }
        OutputFormat::Json => {
            let output = ListOutput {
                page: options.page,
                count: listing.count,
                rows: &listing.entities,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
    }
    Ok(())
}
