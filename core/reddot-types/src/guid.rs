//! Identifier type used for every server-side object.
//!
//! The canonical textual form is the bracketed, dashed, upper-case form
//! `{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9}`. It is the only form that
//! [`Guid::parse`] accepts and the only form written into outgoing commands,
//! so `parse` and `Display` are inverse to each other.

use crate::{IdentityError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the canonical textual form, braces included.
pub const CANONICAL_LEN: usize = 38;

const DASH_POSITIONS: [usize; 4] = [9, 14, 19, 24];

/// Unique server-assigned reference to a remote object.
///
/// Equality and hashing use the 128-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(Uuid);

impl Guid {
    /// The all-zero GUID the server uses for "no reference".
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Creates a random GUID.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a GUID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates a GUID from its 128-bit value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the 128-bit value.
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// True for the all-zero GUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parses the canonical form. Anything else is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        if !is_canonical(text) {
            return Err(IdentityError::Malformed(text.to_string()));
        }
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|_| IdentityError::Malformed(text.to_string()))
    }

    /// Parses any textual GUID form in any case: 32 bare hex digits,
    /// dashed, braced or URN.
    ///
    /// Servers report GUIDs in attributes as 32 undashed hex digits, so this
    /// is what response extraction uses.
    pub fn parse_lenient(text: &str) -> Result<Self> {
        Uuid::parse_str(text.trim())
            .map(Self)
            .map_err(|_| IdentityError::Malformed(text.to_string()))
    }

    /// Formats the GUID in canonical form.
    #[must_use]
    pub fn to_rql_string(&self) -> String {
        let mut buf = Uuid::encode_buffer();
        self.0.braced().encode_upper(&mut buf).to_string()
    }
}

fn is_canonical(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != CANONICAL_LEN || bytes[0] != b'{' || bytes[CANONICAL_LEN - 1] != b'}' {
        return false;
    }
    bytes[1..CANONICAL_LEN - 1]
        .iter()
        .enumerate()
        .all(|(i, b)| {
            if DASH_POSITIONS.contains(&(i + 1)) {
                *b == b'-'
            } else {
                b.is_ascii_digit() || (b'A'..=b'F').contains(b)
            }
        })
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        f.write_str(self.0.braced().encode_upper(&mut buf))
    }
}

impl FromStr for Guid {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::nil()
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rql_string())
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Guid::parse(&text).map_err(serde::de::Error::custom)
    }
}
