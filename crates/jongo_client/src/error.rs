//! Error types for the Jongo client.

use crate::entity::LifecycleState;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to a Jongo resource.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("remote operation failed ({status}): {message}")]
    RemoteOperationFailed {
        /// Message decoded from the error payload.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The entity is not part of the store's current collection.
    #[error("entity is not in the store")]
    EntityNotInCollection,

    /// The operation needs an identity and the entity has none.
    #[error("entity has no identity")]
    MissingIdentity,

    /// The entity is not bound to a proxy.
    #[error("proxy has not been set for this entity")]
    ProxyNotConfigured,

    /// Only ghost, dirty or dead entities can be committed.
    #[error("cannot commit an entity in state {state:?}")]
    InvalidCommitState {
        /// State of the entity at commit time.
        state: LifecycleState,
    },

    /// A bookkeeping field was assigned a value it cannot hold.
    #[error("field {field} cannot be assigned through set")]
    UnassignableField {
        /// Field name.
        field: String,
    },

    /// Network or client-level failure before a status was received.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the request can be retried.
        retryable: bool,
    },

    /// A payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Creates a remote failure from a decoded message and status.
    pub fn remote(message: impl Into<String>, status: u16) -> Self {
        Self::RemoteOperationFailed {
            message: message.into(),
            status,
        }
    }

    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns the HTTP status if the server rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RemoteOperationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the server produced this error.
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::RemoteOperationFailed { .. })
    }

    /// Returns true if a caller may reasonably retry the operation.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            ClientError::RemoteOperationFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
