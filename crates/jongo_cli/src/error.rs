//! CLI error types.

use jongo_client::ClientError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// The command needs `--table`.
    #[error("table required: pass --table")]
    MissingTable,

    /// An assignment was not of the form `column=value`.
    #[error("invalid assignment {0:?}: expected column=value")]
    InvalidAssignment(String),

    /// Client error.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
