//! Query builders: paging, sorting and dynamic finders.
//!
//! Each builder renders the fragment it owns; the proxy decides how the
//! fragments are joined into a request path.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// A page cursor: 0-based index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    index: i64,
    size: u32,
}

impl Page {
    /// Creates the first page with the given size.
    pub fn new(size: u32) -> Self {
        Self { index: 0, size }
    }

    /// Returns the same page size positioned at `index`.
    ///
    /// Negative indexes are accepted and rendered as-is.
    #[must_use]
    pub fn at(self, index: i64) -> Self {
        Self { index, ..self }
    }

    /// Page index.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Rows per page.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Offset of the first row: `index * size`, saturating at the `i64`
    /// bounds.
    pub fn offset(&self) -> i64 {
        self.index.saturating_mul(i64::from(self.size))
    }

    /// Renders `limit={size}&offset={offset}`.
    pub fn query_string(&self) -> String {
        format!("limit={}&offset={}", self.size, self.offset())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// Wire form: `ASC` or `DESC`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(format!("invalid sort direction: {}", other)),
        }
    }
}

/// Ordering requested from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    column: String,
    direction: Direction,
}

impl Sort {
    /// Sorts by `column` in `direction`.
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Column to sort by.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Renders `sort={column}&dir={direction}`.
    pub fn query_string(&self) -> String {
        format!(
            "sort={}&dir={}",
            encode_component(&self.column),
            self.direction
        )
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new("id", Direction::Asc)
    }
}

/// A named server-side finder such as `findAllByMakerAndYearGreaterThan`.
///
/// The server parses the name; the client only carries it with its
/// positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFinder {
    finder: String,
    args: Vec<Value>,
}

impl DynamicFinder {
    /// Creates a finder with positional arguments.
    pub fn new<I, V>(finder: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            finder: finder.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `findBy{Column}`: the server returns the first match.
    pub fn find_by(column: &str) -> Self {
        Self::new(format!("findBy{}", capitalize(column)), Vec::<Value>::new())
    }

    /// `findAllBy{Column}`: the server returns every match.
    pub fn find_all_by(column: &str) -> Self {
        Self::new(format!("findAllBy{}", capitalize(column)), Vec::<Value>::new())
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Finder name.
    pub fn finder(&self) -> &str {
        &self.finder
    }

    /// Positional arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Renders `/dynamic/{finder}` followed by `?args=..&args=..` when
    /// arguments are present.
    pub fn path(&self) -> String {
        let mut path = format!("/dynamic/{}", encode_component(&self.finder));
        path.push_str(&args_query(&self.args));
        path
    }
}

/// Renders `?args=a&args=b`, or nothing for an empty list.
pub(crate) fn args_query(args: &[Value]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| format!("args={}", encode_component(&arg.to_string())))
        .collect();
    format!("?{}", rendered.join("&"))
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub(crate) fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
