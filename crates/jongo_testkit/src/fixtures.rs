//! Demo fixtures and proxy helpers.
//!
//! The tables mirror the data a Jongo server seeds in demo mode: two users,
//! three cars keyed by `cid` and a monthly `maker_stats` series.

use crate::server::{MemoryServer, Table};
use jongo_client::{
    Endpoint, HttpTransport, LoopbackClient, Proxy, Record, Schema, Transport,
};
use serde_json::json;
use std::sync::Arc;

/// Database alias of the demo tables.
pub const DEMO_DATABASE: &str = "demo";

/// Path prefix of the demo server.
pub const DEMO_ROOT: &str = "/jongo";

/// Target reported by requests routed to a [`MemoryServer`].
pub const MEMORY_TARGET: &str = "memory";

/// Car makers present in `maker_stats`.
pub const MAKERS: [&str; 3] = ["CITROEN", "FIAT", "BMW"];

/// Page size the demo uses for `maker_stats`.
pub const MAKER_STATS_PAGE_SIZE: u32 = 50;

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// `user(id, name, age)`.
pub fn user_schema() -> Schema {
    Schema::new("user").fields(["name", "age"])
}

/// `car(cid, model, maker, fuel, transmission, year)`.
pub fn car_schema() -> Schema {
    Schema::new("car")
        .with_identity_field("cid")
        .fields(["model", "maker", "fuel", "transmission", "year"])
}

/// `maker_stats(id, maker, year, month, sales)`.
pub fn maker_stats_schema() -> Schema {
    Schema::new("maker_stats").fields(["maker", "year", "month", "sales"])
}

/// The two demo users.
pub fn user_rows() -> Vec<Record> {
    vec![
        record(json!({"id": 0, "name": "foo", "age": 30})),
        record(json!({"id": 1, "name": "bar", "age": 33})),
    ]
}

/// The three demo cars. The Fiat's model is stored as a number.
pub fn car_rows() -> Vec<Record> {
    vec![
        record(json!({
            "cid": 0, "model": "C2", "maker": "CITROEN",
            "fuel": "Gasoline", "transmission": "Manual", "year": 2008
        })),
        record(json!({
            "cid": 1, "model": 500, "maker": "FIAT",
            "fuel": null, "transmission": "Manual", "year": 2010
        })),
        record(json!({
            "cid": 2, "model": "X5", "maker": "BMW",
            "fuel": "Diesel", "transmission": "Automatic", "year": 2011
        })),
    ]
}

/// Monthly sales per maker from 2000 to 2011, ids starting at 0.
pub fn maker_stats_rows() -> Vec<Record> {
    let mut rows = Vec::new();
    for year in 2000..2012 {
        for month in 1..=12 {
            for (offset, maker) in MAKERS.iter().enumerate() {
                let id = rows.len();
                rows.push(record(json!({
                    "id": id,
                    "maker": maker,
                    "year": year,
                    "month": month,
                    "sales": (year * month + offset as i32 * 7) % 100,
                })));
            }
        }
    }
    rows
}

/// A server mounted at [`DEMO_ROOT`] holding the demo tables.
///
/// Registers the named query `carsOlderThan`, returning cars built before
/// its single argument.
pub fn demo_server() -> Arc<MemoryServer> {
    let server = MemoryServer::new().with_root(DEMO_ROOT);
    server.add_table(DEMO_DATABASE, "user", Table::new("id").with_rows(user_rows()));
    server.add_table(DEMO_DATABASE, "car", Table::new("cid").with_rows(car_rows()));
    server.add_table(
        DEMO_DATABASE,
        "maker_stats",
        Table::new("id").with_rows(maker_stats_rows()),
    );
    server.register_query(DEMO_DATABASE, "carsOlderThan", "car", |row, args| {
        let limit = args.first().and_then(|a| a.parse::<i64>().ok());
        match (row.get("year").and_then(|y| y.as_i64()), limit) {
            (Some(year), Some(limit)) => year < limit,
            _ => false,
        }
    });
    Arc::new(server)
}

/// Transport routing requests to `server` through the HTTP decoding path.
pub fn memory_transport(server: &Arc<MemoryServer>) -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(LoopbackClient::new(Arc::clone(server))))
}

/// Endpoint of a demo table.
pub fn demo_endpoint(table: &str) -> Endpoint {
    Endpoint::new(MEMORY_TARGET, DEMO_DATABASE, table).with_root(DEMO_ROOT)
}

/// Proxy for the `user` table.
pub fn user_proxy(server: &Arc<MemoryServer>) -> Arc<Proxy> {
    Arc::new(Proxy::new(
        demo_endpoint("user"),
        user_schema(),
        memory_transport(server),
    ))
}

/// Proxy for the `car` table.
pub fn car_proxy(server: &Arc<MemoryServer>) -> Arc<Proxy> {
    Arc::new(Proxy::new(
        demo_endpoint("car"),
        car_schema(),
        memory_transport(server),
    ))
}

/// Proxy for the `maker_stats` table, paged by [`MAKER_STATS_PAGE_SIZE`].
pub fn maker_stats_proxy(server: &Arc<MemoryServer>) -> Arc<Proxy> {
    Arc::new(
        Proxy::new(
            demo_endpoint("maker_stats"),
            maker_stats_schema(),
            memory_transport(server),
        )
        .with_page_size(MAKER_STATS_PAGE_SIZE),
    )
}
