//! Error types for the object model.

use reddot_protocol::ProtocolError;
use reddot_types::{Guid, IdentityError};
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while materializing objects or reading collections.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The channel failed (transport, remote rejection, bad reply).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The full-object command for one entity failed.
    #[error("loading <{element}> {guid} failed: {source}")]
    Fetch {
        guid: Guid,
        element: String,
        #[source]
        source: ProtocolError,
    },

    /// The list command of a collection failed.
    #[error("listing <{element}> failed: {source}")]
    Query {
        element: String,
        #[source]
        source: ProtocolError,
    },

    /// A full-object load returned no matching element.
    #[error("no <{element}> returned for {guid}")]
    EntityNotFound { guid: Guid, element: String },

    /// A full-object load returned more than one matching element.
    #[error("{count} <{element}> elements returned for {guid}, expected one")]
    AmbiguousEntity {
        guid: Guid,
        element: String,
        count: usize,
    },

    /// Collection lookup miss.
    #[error("no element with {kind} {key:?}")]
    NotFound { kind: &'static str, key: String },

    /// A field the server did not provide even after a full load.
    #[error("field {field} of {guid} is not provided by the server")]
    MissingField { guid: Guid, field: &'static str },

    #[error("<{element}> has no {attribute} attribute")]
    MissingAttribute { element: String, attribute: String },

    #[error("<{element}> attribute {attribute}={value:?} is invalid")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("unknown type tag {0:?}")]
    UnknownTypeTag(String),

    #[error("type tag {0:?} is already registered")]
    DuplicateTypeTag(String),
}

impl ModelError {
    pub fn not_found_name(name: &str) -> Self {
        ModelError::NotFound {
            kind: "name",
            key: name.to_string(),
        }
    }

    pub fn not_found_guid(guid: Guid) -> Self {
        ModelError::NotFound {
            kind: "guid",
            key: guid.to_string(),
        }
    }

    /// The channel failure behind this error, if any.
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            ModelError::Protocol(e)
            | ModelError::Fetch { source: e, .. }
            | ModelError::Query { source: e, .. } => Some(e),
            _ => None,
        }
    }

    /// True for the transport-level failure a caller may retry.
    pub fn is_transport(&self) -> bool {
        self.protocol_error().is_some_and(ProtocolError::is_transport)
    }

    /// Server-supplied reason when the server rejected a command.
    pub fn remote_reason(&self) -> Option<&str> {
        self.protocol_error().and_then(ProtocolError::remote_reason)
    }
}
