//! Transport layer abstraction and response decoding.

use crate::entity::Record;
use crate::error::{ClientError, ClientResult};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::fmt;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
    /// HEAD.
    Head,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to a Jongo server.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Host (and port) of the server.
    pub target: String,
    /// Path including the query string.
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<String>,
}

impl Request {
    /// Creates a GET request carrying the JSON content headers.
    pub fn new(target: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            path: path.into(),
            method: Method::Get,
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Accept".into(), "application/json".into()),
            ],
            body: None,
        }
    }

    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serializes `record` as the JSON body.
    pub fn json_body(mut self, record: &Record) -> ClientResult<Self> {
        self.body = Some(serde_json::to_string(record)?);
        Ok(self)
    }

    /// Looks up a header by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Path without the query string.
    pub fn path_only(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }

    /// Query string without the leading `?`, if any.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }
}

/// Decoded failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Failure {
    /// Human readable message.
    pub message: String,
    /// SQL state reported by the database driver, if any.
    pub sql_state: Option<String>,
    /// Vendor error code reported by the database driver, if any.
    pub sql_code: Option<i64>,
}

/// Decoded response of a single round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Count` header.
    pub count: Option<u64>,
    outcome: Result<Vec<Record>, Failure>,
}

impl Response {
    /// Builds a successful response.
    pub fn success(status: u16, records: Vec<Record>) -> Self {
        let count = Some(records.len() as u64);
        Self {
            status,
            count,
            outcome: Ok(records),
        }
    }

    /// Builds a failed response.
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            count: None,
            outcome: Err(Failure {
                message: message.into(),
                ..Failure::default()
            }),
        }
    }

    /// Overrides the count header value.
    #[must_use]
    pub fn with_count(mut self, count: Option<u64>) -> Self {
        self.count = count;
        self
    }

    /// Returns true for status 200 or 201.
    pub fn is_success_status(status: u16) -> bool {
        status == 200 || status == 201
    }

    /// Decodes a raw status, count header and body.
    ///
    /// Success bodies are `{"cells": [..]}`; an empty body decodes to no
    /// records. Failure bodies carry a `message` field; a body that is not
    /// JSON is used as the message itself.
    pub fn decode(status: u16, count: Option<&str>, body: &[u8]) -> ClientResult<Self> {
        let count = count.and_then(|c| c.trim().parse::<u64>().ok());

        if Self::is_success_status(status) {
            let records = decode_cells(body)?;
            return Ok(Self {
                status,
                count,
                outcome: Ok(records),
            });
        }

        Ok(Self {
            status,
            count,
            outcome: Err(decode_failure(status, body)),
        })
    }

    /// Returns true if the server accepted the request.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Decoded records of a successful response.
    pub fn records(&self) -> &[Record] {
        match &self.outcome {
            Ok(records) => records,
            Err(_) => &[],
        }
    }

    /// Decoded failure of a rejected response.
    pub fn failure_detail(&self) -> Option<&Failure> {
        self.outcome.as_ref().err()
    }

    /// Converts the response into its records, or a
    /// [`ClientError::RemoteOperationFailed`].
    pub fn into_records(self) -> ClientResult<Vec<Record>> {
        let status = self.status;
        self.outcome.map_err(|failure| {
            tracing::warn!(
                status,
                sql_state = failure.sql_state.as_deref(),
                sql_code = failure.sql_code,
                "remote failure: {}",
                failure.message
            );
            ClientError::remote(failure.message, status)
        })
    }

    /// Fails with [`ClientError::RemoteOperationFailed`] unless successful.
    pub fn ensure_success(self) -> ClientResult<()> {
        self.into_records().map(|_| ())
    }
}

fn decode_cells(body: &[u8]) -> ClientResult<Vec<Record>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let json: JsonValue = serde_json::from_slice(body)?;
    let cells = match json.get("cells") {
        Some(JsonValue::Array(cells)) => cells,
        Some(_) => return Err(ClientError::Codec("\"cells\" is not an array".into())),
        None => return Ok(Vec::new()),
    };
    cells
        .iter()
        .map(|cell| match cell {
            JsonValue::Object(record) => Ok(record.clone()),
            other => Err(ClientError::Codec(format!(
                "expected a record object, got {}",
                other
            ))),
        })
        .collect()
}

fn decode_failure(status: u16, body: &[u8]) -> Failure {
    match serde_json::from_slice::<JsonValue>(body) {
        Ok(json) => Failure {
            message: json
                .get("message")
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            sql_state: json
                .get("sqlState")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            sql_code: json.get("sqlCode").and_then(JsonValue::as_i64),
        },
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            Failure {
                message: if text.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    text
                },
                ..Failure::default()
            }
        }
    }
}

/// A transport performs one blocking round trip per request.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-process loopback, mock for testing).
pub trait Transport: Send + Sync {
    /// Performs the request and returns the decoded response.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// failures to complete the round trip are errors.
    fn perform(&self, request: &Request) -> ClientResult<Response>;
}

/// A mock transport for testing.
///
/// Responses are queued and returned in order; every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<Request>>,
    responses: Mutex<VecDeque<Response>>,
}

impl MockTransport {
    /// Creates a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: Response) {
        self.responses.lock().push_back(response);
    }

    /// Returns every request performed so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }
}

impl Transport for MockTransport {
    fn perform(&self, request: &Request) -> ClientResult<Response> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| ClientError::transport_fatal("no mock response queued"))
    }
}
