//! Core type definitions for the RedDot RQL client.
//!
//! Every object on a RedDot server is addressed by a GUID. This crate holds
//! the [`Guid`] type and its textual codec, shared by the protocol layer and
//! the object model.

mod guid;

pub use guid::{CANONICAL_LEN, Guid};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors that can occur when decoding identities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("malformed identity: {0:?}")]
    Malformed(String),
}
