//! Error types for the protocol layer.

use reddot_types::IdentityError;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while executing RQL commands.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request never reached the server or no reply arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server processed the request and rejected it.
    #[error("remote call failed: {reason}")]
    RemoteCallFailed { reason: String },

    /// The reply could not be parsed as an XML document.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The command needs a session but the channel has none.
    #[error("no active session")]
    NoSession,

    /// The command template could not be rendered.
    #[error("template error: {0}")]
    Template(String),

    /// An identity in a command or reply did not decode.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Returns true for failures that happened before the server could
    /// answer. Retrying is the caller's decision.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Transport(_))
    }

    /// Returns the server's own message for rejected calls.
    pub fn remote_reason(&self) -> Option<&str> {
        match self {
            ProtocolError::RemoteCallFailed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProtocolError {
    fn from(err: reqwest::Error) -> Self {
        ProtocolError::Transport(err.to_string())
    }
}
