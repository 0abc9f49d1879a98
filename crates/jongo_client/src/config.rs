//! Client configuration.

use std::time::Duration;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Address of one remote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host (and optional port) of the server, e.g. `localhost:8080`.
    /// A scheme may be included; `http://` is assumed otherwise.
    pub target: String,
    /// Path prefix the server is mounted under, e.g. `/jongo`. Empty for none.
    pub root: String,
    /// Database alias.
    pub database: String,
    /// Table name.
    pub table: String,
}

impl Endpoint {
    /// Creates an endpoint for `database.table` on `target`.
    pub fn new(
        target: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            root: String::new(),
            database: database.into(),
            table: table.into(),
        }
    }

    /// Sets the path prefix the server is mounted under.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        self.root = root.trim_end_matches('/').to_string();
        self
    }

    /// Path of the table: `{root}/{database}/{table}`.
    pub fn resource_path(&self) -> String {
        format!("{}/{}/{}", self.root, self.database, self.table)
    }

    /// Path of a named query: `{root}/{database}/query/{name}`.
    pub fn query_path(&self, name: &str) -> String {
        format!("{}/{}/query/{}", self.root, self.database, name)
    }
}

/// Store behavior switches.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Load on creation and reload whenever page or sort changes.
    pub auto_load: bool,
    /// Sync after every `add`, `update` and `remove`.
    pub auto_sync: bool,
}

impl StoreConfig {
    /// Creates a configuration with both switches off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether query changes reload the store.
    #[must_use]
    pub const fn auto_load(mut self, value: bool) -> Self {
        self.auto_load = value;
        self
    }

    /// Sets whether mutations sync immediately.
    #[must_use]
    pub const fn auto_sync(mut self, value: bool) -> Self {
        self.auto_sync = value;
        self
    }
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Headers added to every request.
    pub headers: Vec<(String, String)>,
}

impl HttpConfig {
    /// Creates a configuration with a 30 second timeout.
    pub fn new() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            headers: Vec::new(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables the request timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}
