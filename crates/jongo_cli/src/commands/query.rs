//! Query command implementation.

use super::{print_entities, OutputFormat};
use crate::error::CliResult;
use jongo_client::{Proxy, Value};
use std::io::Write;

/// Runs a named query with literal arguments.
pub fn run(
    proxy: &Proxy,
    name: &str,
    args: &[String],
    format: OutputFormat,
    out: &mut dyn Write,
) -> CliResult<()> {
    let args: Vec<Value> = args.iter().map(|a| Value::parse_literal(a)).collect();
    let entities = proxy.query(name, &args)?;
    print_entities(&entities, format, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jongo_testkit::{car_proxy, demo_server};

    #[test]
    fn runs_named_query() {
        let server = demo_server();
        let mut out = Vec::new();
        run(
            &car_proxy(&server),
            "carsOlderThan",
            &["2010".to_string()],
            OutputFormat::Json,
            &mut out,
        )
        .unwrap();
        let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["cid"], 0);
    }
}
