//! The protocol channel: command in, checked document out.

use crate::command::{Binding, Command, Wrapping};
use crate::error::{ProtocolError, ProtocolResult};
use crate::escape::escape;
use crate::session::Session;
use crate::transport::Transport;
use crate::xml::Document;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Name of the error marker element in replies.
pub const ERROR_ELEMENT: &str = "ERROR";

/// Executes commands against one session.
///
/// The channel holds no state besides the transport and the session, and
/// never retries. Share it as `Arc<ProtocolChannel>`.
pub struct ProtocolChannel {
    transport: Arc<dyn Transport>,
    session: Option<Session>,
}

impl ProtocolChannel {
    /// A channel sending through `transport` on behalf of `session`.
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            transport,
            session: Some(session),
        }
    }

    /// A channel that can only run [`Wrapping::Bare`] commands.
    pub fn without_session(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            session: None,
        }
    }

    /// The session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Renders, wraps and sends `command`, then parses the reply and checks
    /// it for error markers.
    pub async fn execute(&self, command: &Command) -> ProtocolResult<Document> {
        let request = self.wrap(command)?;
        debug!(
            transport = self.transport.name(),
            wrapping = ?command.wrapping_kind(),
            "executing RQL command"
        );
        trace!(template = command.template());

        let reply = self.transport.send(&request).await?;
        trace!(bytes = reply.len(), "RQL reply received");

        let document = Document::parse(&reply)?;
        if let Err(err) = check_for_errors(&document) {
            warn!(error = %err, template = command.template(), "server rejected RQL command");
            return Err(err);
        }
        Ok(document)
    }

    /// Three-argument form of [`ProtocolChannel::execute`].
    pub async fn execute_template<I, K, V>(
        &self,
        template: impl Into<Cow<'static, str>>,
        bindings: I,
        wrapping: Wrapping,
    ) -> ProtocolResult<Document>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Binding>,
    {
        let command = bindings
            .into_iter()
            .fold(Command::new(template), |cmd, (k, v)| cmd.bind(k, v))
            .wrapping(wrapping);
        self.execute(&command).await
    }

    /// Builds the full `IODATA` request text for `command`.
    pub fn wrap(&self, command: &Command) -> ProtocolResult<String> {
        let key = self.session.as_ref().map(Session::session_key);
        let body = command.render(key)?;

        match command.wrapping_kind() {
            Wrapping::Bare => Ok(format!("<IODATA>{body}</IODATA>")),
            Wrapping::Envelope => {
                let session = self.session.as_ref().ok_or(ProtocolError::NoSession)?;
                Ok(format!(
                    r#"<IODATA loginguid="{}" sessionkey="{}">{body}</IODATA>"#,
                    session.login_guid(),
                    escape(session.session_key())
                ))
            }
            Wrapping::InlineProject => {
                let session = self.session.as_ref().ok_or(ProtocolError::NoSession)?;
                Ok(format!(
                    r#"<IODATA loginguid="{}"><PROJECT sessionkey="{}">{body}</PROJECT></IODATA>"#,
                    session.login_guid(),
                    escape(session.session_key())
                ))
            }
        }
    }
}

/// Looks for the two error shapes servers send:
/// `<IODATA><ERROR>reason</ERROR></IODATA>` and `<IODATA>ERROR</IODATA>`.
pub fn check_for_errors(document: &Document) -> ProtocolResult<()> {
    if let Some(error) = document.first(ERROR_ELEMENT) {
        let text = error.inner_text();
        let reason = match text.trim() {
            "" => ERROR_ELEMENT.to_string(),
            t => t.to_string(),
        };
        return Err(ProtocolError::RemoteCallFailed { reason });
    }
    if document.root().text().trim() == ERROR_ELEMENT {
        return Err(ProtocolError::RemoteCallFailed {
            reason: ERROR_ELEMENT.to_string(),
        });
    }
    Ok(())
}
