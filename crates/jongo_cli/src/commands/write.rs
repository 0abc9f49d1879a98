//! Create, update and delete commands.

use super::parse_assignment;
use crate::error::CliResult;
use jongo_client::{Entity, Proxy, Value};
use std::io::Write;
use tracing::info;

fn assign(entity: &mut Entity, assignments: &[String]) -> CliResult<()> {
    for assignment in assignments {
        let (column, value) = parse_assignment(assignment)?;
        entity.set(&column, value)?;
    }
    Ok(())
}

/// Inserts a row built from `column=value` assignments.
pub fn create(proxy: &Proxy, assignments: &[String], out: &mut dyn Write) -> CliResult<()> {
    let mut entity = proxy.schema().instance();
    assign(&mut entity, assignments)?;
    let identity = proxy
        .create(&entity)?
        .and_then(|row| row.get(proxy.schema().identity_field()).cloned());
    info!(table = %proxy.endpoint().table, "row created");
    match identity {
        Some(id) => writeln!(out, "created {}", Value::from(&id))?,
        None => writeln!(out, "created")?,
    }
    Ok(())
}

/// Updates the given columns of one row.
pub fn update(
    proxy: &Proxy,
    id: &str,
    assignments: &[String],
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut entity = Entity::with_identity(proxy.schema().identity_field(), Value::parse_literal(id));
    assign(&mut entity, assignments)?;
    proxy.update(&entity)?;
    info!(table = %proxy.endpoint().table, id, "row updated");
    writeln!(out, "updated {}", id)?;
    Ok(())
}

/// Deletes one row.
pub fn delete(proxy: &Proxy, id: &str, out: &mut dyn Write) -> CliResult<()> {
    let entity = Entity::with_identity(proxy.schema().identity_field(), Value::parse_literal(id));
    proxy.delete(&entity)?;
    info!(table = %proxy.endpoint().table, id, "row deleted");
    writeln!(out, "deleted {}", id)?;
    Ok(())
}
