//! RQL command templates.
//!
//! A command is markup with `{name}` placeholders plus typed bindings and a
//! [`Wrapping`] that says how the session key travels with it. Rendering
//! escapes every textual binding, so callers never build command strings
//! by hand.
//!
//! ```
//! use reddot_protocol::{Command, Wrapping};
//! use reddot_types::Guid;
//!
//! let page = Guid::from_u128(1);
//! let cmd = Command::new(r#"<PAGE action="save" guid="{guid}" headline="{headline}"/>"#)
//!     .bind("guid", page)
//!     .bind("headline", "Fish & Chips")
//!     .wrapping(Wrapping::InlineProject);
//!
//! assert_eq!(
//!     cmd.render(None).unwrap(),
//!     r#"<PAGE action="save" guid="{00000000-0000-0000-0000-000000000001}" headline="Fish &amp; Chips"/>"#
//! );
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use crate::escape::escape;
use reddot_types::Guid;
use std::borrow::Cow;

/// Reserved placeholder replaced with the live session key at execution.
pub const SESSION_KEY_PLACEHOLDER: &str = "session_key";

/// How the session key accompanies a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrapping {
    /// `<IODATA loginguid=".." sessionkey="..">cmd</IODATA>`: the key is an
    /// attribute of the envelope, outside the command text.
    #[default]
    Envelope,
    /// `<IODATA loginguid=".."><PROJECT sessionkey="..">cmd</PROJECT></IODATA>`:
    /// the literal key is part of the command markup.
    InlineProject,
    /// `<IODATA>cmd</IODATA>`: no session at all.
    Bare,
}

/// A typed value for a template placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Free text, escaped.
    Text(String),
    /// Protocol enum token, escaped.
    Token(String),
    /// Canonical GUID form.
    Guid(Guid),
    /// `1` or `0`.
    Bool(bool),
    Int(i64),
    /// Pre-rendered markup, inserted verbatim.
    Raw(String),
}

impl Binding {
    /// Markup inserted verbatim, without escaping.
    pub fn raw(markup: impl Into<String>) -> Self {
        Binding::Raw(markup.into())
    }

    /// A protocol enum token such as an action verb.
    pub fn token(token: impl Into<String>) -> Self {
        Binding::Token(token.into())
    }

    /// Wire text for this value.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Binding::Text(s) | Binding::Token(s) => escape(s),
            Binding::Guid(g) => Cow::Owned(g.to_rql_string()),
            Binding::Bool(true) => Cow::Borrowed("1"),
            Binding::Bool(false) => Cow::Borrowed("0"),
            Binding::Int(i) => Cow::Owned(i.to_string()),
            Binding::Raw(s) => Cow::Borrowed(s),
        }
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Binding::Text(value.to_string())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::Text(value)
    }
}

impl From<&String> for Binding {
    fn from(value: &String) -> Self {
        Binding::Text(value.clone())
    }
}

impl From<Guid> for Binding {
    fn from(value: Guid) -> Self {
        Binding::Guid(value)
    }
}

impl From<&Guid> for Binding {
    fn from(value: &Guid) -> Self {
        Binding::Guid(*value)
    }
}

impl From<bool> for Binding {
    fn from(value: bool) -> Self {
        Binding::Bool(value)
    }
}

impl From<i64> for Binding {
    fn from(value: i64) -> Self {
        Binding::Int(value)
    }
}

impl From<i32> for Binding {
    fn from(value: i32) -> Self {
        Binding::Int(i64::from(value))
    }
}

impl From<u32> for Binding {
    fn from(value: u32) -> Self {
        Binding::Int(i64::from(value))
    }
}

/// A command template with its bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    template: Cow<'static, str>,
    bindings: Vec<(String, Binding)>,
    wrapping: Wrapping,
}

impl Command {
    /// A command over `template` with no bindings and envelope wrapping.
    pub fn new(template: impl Into<Cow<'static, str>>) -> Self {
        Self {
            template: template.into(),
            bindings: Vec::new(),
            wrapping: Wrapping::default(),
        }
    }

    /// Binds a placeholder. Binding the same name twice replaces the value.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Binding>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.bindings.push((name, value)),
        }
        self
    }

    /// Sets how the session key is attached.
    pub fn wrapping(mut self, wrapping: Wrapping) -> Self {
        self.wrapping = wrapping;
        self
    }

    /// The unrendered template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// How the session key is attached.
    pub fn wrapping_kind(&self) -> Wrapping {
        self.wrapping
    }

    /// The value bound to placeholder `name`.
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    /// Substitutes every placeholder. `{{` and `}}` produce literal braces;
    /// a brace not followed by a placeholder name is copied as is.
    /// `{session_key}` needs `session_key` to be set.
    pub fn render(&self, session_key: Option<&str>) -> ProtocolResult<String> {
        let template = self.template.as_ref();
        let mut out = String::with_capacity(template.len() + 64);
        let mut rest = template;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('}') {
                out.push('}');
                rest = &tail[1..];
                continue;
            }

            match placeholder_name(&tail[1..]) {
                Some(name) => {
                    self.render_placeholder(name, session_key, &mut out)?;
                    rest = &tail[name.len() + 2..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    fn render_placeholder(
        &self,
        name: &str,
        session_key: Option<&str>,
        out: &mut String,
    ) -> ProtocolResult<()> {
        if let Some(binding) = self.binding(name) {
            out.push_str(&binding.render());
            return Ok(());
        }
        if name == SESSION_KEY_PLACEHOLDER {
            let key = session_key.ok_or_else(|| {
                ProtocolError::Template("command needs a session key but none is active".into())
            })?;
            out.push_str(&escape(key));
            return Ok(());
        }
        Err(ProtocolError::Template(format!(
            "placeholder {{{name}}} has no binding"
        )))
    }
}

/// Returns the placeholder name if `s` starts with `name}`.
fn placeholder_name(s: &str) -> Option<&str> {
    let end = s.find('}')?;
    let name = &s[..end];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}
