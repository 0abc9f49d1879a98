//! In-memory Jongo server.
//!
//! [`MemoryServer`] answers the same routes and wire format as a Jongo
//! server running in demo mode, so a real [`jongo_client::Proxy`] can be
//! driven through [`jongo_client::LoopbackClient`] without a network.

use jongo_client::{
    LoopbackServer, Method, RawResponse, Record, Request, CONTENT_COUNT_HEADER, PRIMARY_KEY_HEADER,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Page size used when a listing carries no `limit`.
pub const DEFAULT_LIMIT: usize = 25;

/// One table held by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    primary_key: String,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    /// Creates an empty table keyed by `primary_key`.
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            rows: Vec::new(),
            next_id: 0,
        }
    }

    /// Appends rows in order.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Record>) -> Self {
        for row in rows {
            self.push(row);
        }
        self
    }

    /// Primary key column.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, assigning the next key when the row carries none.
    fn push(&mut self, mut row: Record) -> Record {
        match row.get(&self.primary_key).and_then(JsonValue::as_i64) {
            Some(id) => self.next_id = self.next_id.max(id + 1),
            None => {
                row.insert(self.primary_key.clone(), json!(self.next_id));
                self.next_id += 1;
            }
        }
        self.rows.push(row.clone());
        row
    }

    fn position(&self, key_column: &str, id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(key_column).is_some_and(|v| matches_text(v, id)))
    }
}

type RowFilter = dyn Fn(&Record, &[String]) -> bool + Send + Sync;

struct NamedQuery {
    table: String,
    filter: Arc<RowFilter>,
}

/// A request the server refused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rejection {
    status: u16,
    message: String,
}

impl Rejection {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

type Handled = Result<RawResponse, Rejection>;

/// In-process Jongo server backed by plain row vectors.
///
/// Tables are addressed as `{root}/{database}/{table}`. Every request is
/// recorded so tests can assert on the traffic a client produced.
pub struct MemoryServer {
    root: String,
    tables: RwLock<HashMap<String, Table>>,
    queries: RwLock<HashMap<String, NamedQuery>>,
    failures: Mutex<VecDeque<Rejection>>,
    log: Mutex<Vec<Request>>,
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryServer {
    /// Creates an empty server mounted at `/`.
    pub fn new() -> Self {
        Self {
            root: String::new(),
            tables: RwLock::new(HashMap::new()),
            queries: RwLock::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Mounts the server under a path prefix such as `/jongo`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into().trim_end_matches('/').to_string();
        self
    }

    /// Path prefix the server is mounted under.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Installs a table, replacing any previous one.
    pub fn add_table(&self, database: &str, name: &str, table: Table) {
        self.tables.write().insert(table_key(database, name), table);
    }

    /// Returns a snapshot of a table.
    pub fn table(&self, database: &str, name: &str) -> Option<Table> {
        self.tables.read().get(&table_key(database, name)).cloned()
    }

    /// Registers a named query selecting rows of `table` with `filter`.
    pub fn register_query<F>(&self, database: &str, name: &str, table: &str, filter: F)
    where
        F: Fn(&Record, &[String]) -> bool + Send + Sync + 'static,
    {
        self.queries.write().insert(
            table_key(database, name),
            NamedQuery {
                table: table.to_string(),
                filter: Arc::new(filter),
            },
        );
    }

    /// Makes the next request fail with `status` and `message`.
    pub fn fail_next(&self, status: u16, message: impl Into<String>) {
        self.failures
            .lock()
            .push_back(Rejection::new(status, message));
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Forgets the recorded requests.
    pub fn clear_requests(&self) {
        self.log.lock().clear();
    }

    fn route(&self, request: &Request) -> Handled {
        let path = request
            .path_only()
            .strip_prefix(self.root.as_str())
            .ok_or_else(|| Rejection::not_found("Resource not found"))?;
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(percent_decode)
            .collect();
        let params = Params::parse(request.query());
        let key_column = request.header_value(PRIMARY_KEY_HEADER);

        match (request.method, segments.as_slice()) {
            (Method::Get, [db, kind, name]) if kind == "query" => {
                self.run_query(db, name, &params.args)
            }
            (Method::Get, [db, table]) => self.list(db, table, &params),
            (Method::Head, [db, table]) => self.count(db, table),
            (Method::Post, [db, table]) => self.insert(db, table, request),
            (Method::Get, [db, table, kind, finder]) if kind == "dynamic" => {
                self.find_dynamic(db, table, finder, &params.args)
            }
            (Method::Get, [db, table, id]) => self.read(db, table, key_column, id),
            (Method::Put, [db, table, id]) => self.update(db, table, key_column, id, request),
            (Method::Delete, [db, table, id]) => self.delete(db, table, key_column, id),
            (Method::Get, [db, table, column, value]) => self.find_column(db, table, column, value),
            _ => Err(Rejection::new(405, "Method not allowed")),
        }
    }

    fn with_table<R>(
        &self,
        db: &str,
        table: &str,
        f: impl FnOnce(&Table) -> Result<R, Rejection>,
    ) -> Result<R, Rejection> {
        let tables = self.tables.read();
        let found = tables
            .get(&table_key(db, table))
            .ok_or_else(|| Rejection::not_found(format!("Table {} not found", table)))?;
        f(found)
    }

    fn with_table_mut<R>(
        &self,
        db: &str,
        table: &str,
        f: impl FnOnce(&mut Table) -> Result<R, Rejection>,
    ) -> Result<R, Rejection> {
        let mut tables = self.tables.write();
        let found = tables
            .get_mut(&table_key(db, table))
            .ok_or_else(|| Rejection::not_found(format!("Table {} not found", table)))?;
        f(found)
    }

    fn list(&self, db: &str, table: &str, params: &Params) -> Handled {
        let offset = params.offset.unwrap_or(0);
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT as i64);
        if offset < 0 || limit < 0 {
            return Err(Rejection::bad_request(format!(
                "Invalid limit {} or offset {}",
                limit, offset
            )));
        }

        self.with_table(db, table, |t| {
            let mut rows = t.rows.clone();
            if let Some(column) = &params.sort {
                rows.sort_by(|a, b| compare_json(field(a, column), field(b, column)));
                if params.descending {
                    rows.reverse();
                }
            }
            let cells = rows
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            Ok(success(200, cells))
        })
    }

    fn count(&self, db: &str, table: &str) -> Handled {
        self.with_table(db, table, |t| {
            Ok(RawResponse::new(200, Vec::<u8>::new())
                .with_header(CONTENT_COUNT_HEADER, t.len().to_string()))
        })
    }

    fn insert(&self, db: &str, table: &str, request: &Request) -> Handled {
        let row = parse_body(request)?;
        self.with_table_mut(db, table, |t| {
            let stored = t.push(row);
            Ok(success(201, vec![stored]))
        })
    }

    fn read(&self, db: &str, table: &str, key_column: Option<&str>, id: &str) -> Handled {
        self.with_table(db, table, |t| {
            let key_column = key_column.unwrap_or(&t.primary_key);
            let index = t
                .position(key_column, id)
                .ok_or_else(|| Rejection::not_found(format!("No results for {}", id)))?;
            Ok(success(200, vec![t.rows[index].clone()]))
        })
    }

    fn update(
        &self,
        db: &str,
        table: &str,
        key_column: Option<&str>,
        id: &str,
        request: &Request,
    ) -> Handled {
        let changes = parse_body(request)?;
        self.with_table_mut(db, table, |t| {
            let key_column = key_column.unwrap_or(&t.primary_key).to_string();
            let index = t
                .position(&key_column, id)
                .ok_or_else(|| Rejection::not_found(format!("No results for {}", id)))?;
            let row = &mut t.rows[index];
            for (column, value) in changes {
                if column != key_column {
                    row.insert(column, value);
                }
            }
            Ok(success(200, vec![row.clone()]))
        })
    }

    fn delete(&self, db: &str, table: &str, key_column: Option<&str>, id: &str) -> Handled {
        self.with_table_mut(db, table, |t| {
            let key_column = key_column.unwrap_or(&t.primary_key).to_string();
            let index = t
                .position(&key_column, id)
                .ok_or_else(|| Rejection::not_found(format!("No results for {}", id)))?;
            t.rows.remove(index);
            Ok(success(200, Vec::new()))
        })
    }

    fn find_column(&self, db: &str, table: &str, column: &str, value: &str) -> Handled {
        self.with_table(db, table, |t| {
            let cells = t
                .rows
                .iter()
                .filter(|row| row.get(column).is_some_and(|v| matches_text(v, value)))
                .cloned()
                .collect();
            Ok(success(200, cells))
        })
    }

    fn find_dynamic(&self, db: &str, table: &str, name: &str, args: &[String]) -> Handled {
        let finder = Finder::parse(name)
            .ok_or_else(|| Rejection::bad_request(format!("Invalid finder {}", name)))?;
        if finder.arity() != args.len() {
            return Err(Rejection::bad_request(format!(
                "Finder {} expects {} arguments, got {}",
                name,
                finder.arity(),
                args.len()
            )));
        }

        self.with_table(db, table, |t| {
            let matches = t.rows.iter().filter(|row| finder.matches(row, args));
            let cells: Vec<Record> = if finder.first_only {
                matches.take(1).cloned().collect()
            } else {
                matches.cloned().collect()
            };
            Ok(success(200, cells))
        })
    }

    fn run_query(&self, db: &str, name: &str, args: &[String]) -> Handled {
        let (table, filter) = {
            let queries = self.queries.read();
            let query = queries
                .get(&table_key(db, name))
                .ok_or_else(|| Rejection::bad_request(format!("Invalid query {}", name)))?;
            (query.table.clone(), Arc::clone(&query.filter))
        };
        self.with_table(db, &table, |t| {
            let cells = t
                .rows
                .iter()
                .filter(|row| filter(row, args))
                .cloned()
                .collect();
            Ok(success(200, cells))
        })
    }
}

impl LoopbackServer for MemoryServer {
    fn handle(&self, request: &Request) -> RawResponse {
        self.log.lock().push(request.clone());

        let injected = self.failures.lock().pop_front();
        let outcome = match injected {
            Some(rejection) => Err(rejection),
            None => self.route(request),
        };

        let response = outcome.unwrap_or_else(|rejection| failure(&rejection));
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "memory server"
        );
        response
    }
}

fn table_key(database: &str, name: &str) -> String {
    format!("{}/{}", database, name)
}

fn success(status: u16, cells: Vec<Record>) -> RawResponse {
    let count = cells.len();
    let body = json!({ "success": true, "cells": cells });
    RawResponse::new(status, body.to_string()).with_header(CONTENT_COUNT_HEADER, count.to_string())
}

fn failure(rejection: &Rejection) -> RawResponse {
    let body = json!({ "success": false, "message": rejection.message });
    RawResponse::new(rejection.status, body.to_string())
}

fn parse_body(request: &Request) -> Result<Record, Rejection> {
    let body = request
        .body
        .as_deref()
        .ok_or_else(|| Rejection::bad_request("Missing request body"))?;
    match serde_json::from_str::<JsonValue>(body) {
        Ok(JsonValue::Object(record)) => Ok(record),
        Ok(_) => Err(Rejection::bad_request("Request body is not an object")),
        Err(e) => Err(Rejection::bad_request(format!("Invalid JSON: {}", e))),
    }
}

fn field<'a>(row: &'a Record, column: &str) -> &'a JsonValue {
    row.get(column).unwrap_or(&JsonValue::Null)
}

/// Rendered form of a cell, as it appears in a path segment.
fn text_of(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_text(value: &JsonValue, text: &str) -> bool {
    compare_arg(value, text) == Some(Ordering::Equal)
}

/// Compares a cell with a textual argument; numbers compare numerically.
fn compare_arg(value: &JsonValue, arg: &str) -> Option<Ordering> {
    match value {
        JsonValue::Null => None,
        JsonValue::Number(n) => match (n.as_f64(), arg.parse::<f64>()) {
            (Some(a), Ok(b)) => a.partial_cmp(&b),
            _ => Some(text_of(value).as_str().cmp(arg)),
        },
        other => Some(text_of(other).as_str().cmp(arg)),
    }
}

/// Total order over cells: nulls, booleans, numbers, then strings.
fn compare_json(a: &JsonValue, b: &JsonValue) -> Ordering {
    fn rank(value: &JsonValue) -> u8 {
        match value {
            JsonValue::Null => 0,
            JsonValue::Bool(_) => 1,
            JsonValue::Number(_) => 2,
            JsonValue::String(_) => 3,
            JsonValue::Array(_) => 4,
            JsonValue::Object(_) => 5,
        }
    }

    match (a, b) {
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Query-string parameters understood by the listing routes.
#[derive(Debug, Default)]
struct Params {
    limit: Option<i64>,
    offset: Option<i64>,
    sort: Option<String>,
    descending: bool,
    args: Vec<String>,
}

impl Params {
    fn parse(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value);
            match key {
                "limit" => params.limit = value.parse().ok(),
                "offset" => params.offset = value.parse().ok(),
                "sort" => params.sort = Some(value),
                "dir" => params.descending = value.eq_ignore_ascii_case("desc"),
                "args" => params.args.push(value),
                _ => {}
            }
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    GreaterThan,
    GreaterThanEquals,
    LessThan,
    LessThanEquals,
    IsNull,
    IsNotNull,
    Between,
}

impl Operator {
    fn arity(self) -> usize {
        match self {
            Operator::IsNull | Operator::IsNotNull => 0,
            Operator::Between => 2,
            _ => 1,
        }
    }
}

const KEYWORDS: [&str; 10] = [
    "Greater", "Less", "Than", "Equals", "Is", "Not", "Null", "Between", "And", "Or",
];

/// A parsed `findBy…` / `findAllBy…` name.
#[derive(Debug, Clone, PartialEq)]
struct Finder {
    first_only: bool,
    disjunctive: bool,
    conditions: Vec<(String, Operator)>,
}

impl Finder {
    fn parse(name: &str) -> Option<Self> {
        let (first_only, rest) = if let Some(rest) = name.strip_prefix("findAllBy") {
            (false, rest)
        } else if let Some(rest) = name.strip_prefix("findBy") {
            (true, rest)
        } else {
            return None;
        };

        let owned = split_camel_case(rest);
        let words: Vec<&str> = owned.iter().map(String::as_str).collect();
        let mut conditions = Vec::new();
        let mut disjunctive = false;
        let mut i = 0;

        while i < words.len() {
            let column = words[i];
            if KEYWORDS.contains(&column) {
                return None;
            }
            i += 1;

            let (operator, used) = match &words[i..] {
                ["Greater", "Than", "Equals", ..] => (Operator::GreaterThanEquals, 3),
                ["Greater", "Than", ..] => (Operator::GreaterThan, 2),
                ["Less", "Than", "Equals", ..] => (Operator::LessThanEquals, 3),
                ["Less", "Than", ..] => (Operator::LessThan, 2),
                ["Is", "Not", "Null", ..] => (Operator::IsNotNull, 3),
                ["Is", "Null", ..] => (Operator::IsNull, 2),
                ["Equals", ..] => (Operator::Equals, 1),
                ["Between", ..] => (Operator::Between, 1),
                _ => (Operator::Equals, 0),
            };
            i += used;
            conditions.push((column.to_lowercase(), operator));

            match words.get(i) {
                None => break,
                Some(&"And") => {}
                Some(&"Or") => disjunctive = true,
                Some(_) => return None,
            }
            i += 1;
            if i == words.len() {
                return None;
            }
        }

        if conditions.is_empty() {
            return None;
        }
        Some(Self {
            first_only,
            disjunctive,
            conditions,
        })
    }

    fn arity(&self) -> usize {
        self.conditions.iter().map(|(_, op)| op.arity()).sum()
    }

    fn matches(&self, row: &Record, args: &[String]) -> bool {
        let mut remaining = args;
        let mut results = self.conditions.iter().map(|(column, operator)| {
            let (taken, rest) = remaining.split_at(operator.arity());
            remaining = rest;
            evaluate(field(row, column), *operator, taken)
        });
        if self.disjunctive {
            results.any(|hit| hit)
        } else {
            results.all(|hit| hit)
        }
    }
}

fn evaluate(value: &JsonValue, operator: Operator, args: &[String]) -> bool {
    let cmp = |i: usize| args.get(i).and_then(|arg| compare_arg(value, arg));
    match operator {
        Operator::IsNull => value.is_null(),
        Operator::IsNotNull => !value.is_null(),
        Operator::Equals => cmp(0) == Some(Ordering::Equal),
        Operator::GreaterThan => cmp(0) == Some(Ordering::Greater),
        Operator::GreaterThanEquals => matches!(cmp(0), Some(Ordering::Greater | Ordering::Equal)),
        Operator::LessThan => cmp(0) == Some(Ordering::Less),
        Operator::LessThanEquals => matches!(cmp(0), Some(Ordering::Less | Ordering::Equal)),
        Operator::Between => {
            matches!(cmp(0), Some(Ordering::Greater | Ordering::Equal))
                && matches!(cmp(1), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

fn split_camel_case(input: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for c in input.chars() {
        if c.is_uppercase() || words.is_empty() {
            words.push(String::new());
        }
        if let Some(word) = words.last_mut() {
            word.push(c);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn server() -> MemoryServer {
        let server = MemoryServer::new().with_root("/jongo");
        server.add_table(
            "demo",
            "car",
            Table::new("cid").with_rows([
                row(json!({"cid": 1, "model": "C2", "year": 2008})),
                row(json!({"cid": 2, "model": 500, "year": 2010})),
                row(json!({"cid": 3, "model": "X5", "year": 2011, "fuel": null})),
            ]),
        );
        server
    }

    fn get(server: &MemoryServer, path: &str) -> (u16, JsonValue) {
        let response = server.handle(&Request::new("memory", path));
        let body = serde_json::from_slice(&response.body).unwrap_or(JsonValue::Null);
        (response.status, body)
    }

    #[test]
    fn finder_names_parse() {
        let finder = Finder::parse("findAllByYearGreaterThanAndYearLessThanEquals").unwrap();
        assert!(!finder.first_only);
        assert!(!finder.disjunctive);
        assert_eq!(
            finder.conditions,
            vec![
                ("year".to_string(), Operator::GreaterThan),
                ("year".to_string(), Operator::LessThanEquals),
            ]
        );
        assert_eq!(finder.arity(), 2);

        let finder = Finder::parse("findByFuelIsNull").unwrap();
        assert!(finder.first_only);
        assert_eq!(finder.arity(), 0);

        assert!(Finder::parse("findAllBy").is_none());
        assert!(Finder::parse("findAllByYearAnd").is_none());
        assert!(Finder::parse("listYear").is_none());
    }

    #[test]
    fn list_sorts_mixed_cells() {
        let server = server();
        let (status, body) = get(&server, "/jongo/demo/car?limit=25&offset=0&sort=model&dir=ASC");
        assert_eq!(status, 200);
        assert_eq!(body["cells"][0]["model"], json!(500));

        let (_, body) = get(&server, "/jongo/demo/car?limit=25&offset=0&sort=model&dir=DESC");
        assert_eq!(body["cells"][0]["model"], json!("X5"));
    }

    #[test]
    fn list_rejects_negative_offset() {
        let (status, body) = get(&server(), "/jongo/demo/car?limit=25&offset=-25");
        assert_eq!(status, 400);
        assert_eq!(body["success"], json!(false));
    }

    #[test]
    fn unknown_table_is_not_found() {
        let (status, _) = get(&server(), "/jongo/demo/boat");
        assert_eq!(status, 404);
        let (status, _) = get(&server(), "/demo/car");
        assert_eq!(status, 404);
    }

    #[test]
    fn dynamic_finder_route() {
        let server = server();
        let (_, body) = get(
            &server,
            "/jongo/demo/car/dynamic/findAllByYearGreaterThanAndYearLessThanEquals?args=2007&args=2010",
        );
        assert_eq!(body["cells"].as_array().unwrap().len(), 2);

        let (status, _) = get(&server, "/jongo/demo/car/dynamic/findByYear");
        assert_eq!(status, 400);
    }

    #[test]
    fn insert_assigns_next_key() {
        let server = server();
        let request = Request::new("memory", "/jongo/demo/car")
            .method(Method::Post)
            .json_body(&row(json!({"model": "206cc"})))
            .unwrap();
        let response = server.handle(&request);
        assert_eq!(response.status, 201);
        let table = server.table("demo", "car").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows()[3]["cid"], json!(4));
    }

    #[test]
    fn injected_failure_applies_once() {
        let server = server();
        server.fail_next(503, "maintenance");
        assert_eq!(get(&server, "/jongo/demo/car").0, 503);
        assert_eq!(get(&server, "/jongo/demo/car").0, 200);
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%4"), "%4");
    }
}
