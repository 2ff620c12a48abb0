//! Session context passed into the channel.

use reddot_types::Guid;
use std::fmt;

/// Credentials of a logged-in session.
///
/// Created by the login step and handed to [`crate::ProtocolChannel`];
/// dropping the channel ends its use. There is no process-wide session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    login_guid: Guid,
    session_key: String,
}

impl Session {
    /// A session for `login_guid` authenticated by `session_key`.
    pub fn new(login_guid: Guid, session_key: impl Into<String>) -> Self {
        Self {
            login_guid,
            session_key: session_key.into(),
        }
    }

    /// GUID of the login this session belongs to.
    pub fn login_guid(&self) -> Guid {
        self.login_guid
    }

    /// The live session key.
    pub fn session_key(&self) -> &str {
        &self.session_key
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("login_guid", &self.login_guid)
            .field("session_key", &"<redacted>")
            .finish()
    }
}
