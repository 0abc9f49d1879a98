//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so the transport can
//! run over `reqwest`, or over an in-process server for tests.

use crate::error::{ClientError, ClientResult};
use crate::transport::{Request, Response, Transport};
use crate::CONTENT_COUNT_HEADER;
use parking_lot::RwLock;
use std::sync::Arc;

/// Undecoded response as produced by an [`HttpClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response with a body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP round trip.
pub trait HttpClient: Send + Sync {
    /// Sends the request and returns the raw response.
    ///
    /// Any status counts as a response; errors are reserved for failures to
    /// complete the round trip.
    fn send(&self, request: &Request) -> Result<RawResponse, String>;

    /// Checks if the client is healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Transport decoding Jongo responses received through an [`HttpClient`].
pub struct HttpTransport<C: HttpClient> {
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(client: C) -> Self {
        Self {
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }
}

impl<C: HttpClient> Transport for HttpTransport<C> {
    fn perform(&self, request: &Request) -> ClientResult<Response> {
        if !self.client.is_healthy() {
            return Err(ClientError::transport_retryable("http client is not healthy"));
        }

        let raw = self.client.send(request).map_err(|e| {
            tracing::warn!(path = %request.path, "transport failure: {}", e);
            *self.last_error.write() = Some(e.clone());
            ClientError::transport_retryable(e)
        })?;
        *self.last_error.write() = None;

        Response::decode(raw.status, raw.header(CONTENT_COUNT_HEADER), &raw.body)
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles one request and returns the response.
    fn handle(&self, request: &Request) -> RawResponse;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for Arc<S> {
    fn handle(&self, request: &Request) -> RawResponse {
        (**self).handle(request)
    }
}

/// An HTTP client that routes requests directly to an in-process server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    fn send(&self, request: &Request) -> Result<RawResponse, String> {
        Ok(self.server.handle(request))
    }
}

#[cfg(feature = "http")]
pub use reqwest_client::ReqwestClient;

#[cfg(feature = "http")]
mod reqwest_client {
    use super::{HttpClient, RawResponse};
    use crate::config::HttpConfig;
    use crate::error::{ClientError, ClientResult};
    use crate::transport::{Method, Request};

    /// Blocking HTTP client backed by `reqwest`.
    pub struct ReqwestClient {
        inner: reqwest::blocking::Client,
        config: HttpConfig,
    }

    impl ReqwestClient {
        /// Builds a client from the configuration.
        pub fn new(config: HttpConfig) -> ClientResult<Self> {
            let mut builder = reqwest::blocking::Client::builder();
            if let Some(timeout) = config.timeout {
                builder = builder.timeout(timeout);
            }
            let inner = builder
                .build()
                .map_err(|e| ClientError::transport_fatal(e.to_string()))?;
            Ok(Self { inner, config })
        }

        fn url(request: &Request) -> String {
            if request.target.contains("://") {
                format!("{}{}", request.target.trim_end_matches('/'), request.path)
            } else {
                format!("http://{}{}", request.target, request.path)
            }
        }
    }

    impl HttpClient for ReqwestClient {
        fn send(&self, request: &Request) -> Result<RawResponse, String> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
                Method::Head => reqwest::Method::HEAD,
            };

            let mut builder = self.inner.request(method, Self::url(request));
            for (name, value) in self.config.headers.iter().chain(request.headers.iter()) {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().map_err(|e| e.to_string())?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().map_err(|e| e.to_string())?.to_vec();

            Ok(RawResponse {
                status,
                headers,
                body,
            })
        }
    }

}
