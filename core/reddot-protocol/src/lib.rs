//! RQL protocol layer for RedDot servers.
//!
//! Turns structured calls into RQL request text and RQL reply text back into
//! checked XML documents.
//!
//! ## Components
//!
//! - **Command**: a markup template with typed, escaped bindings and a
//!   [`Wrapping`] that says how the session key is attached
//! - **Transport**: moves request text to the server ([`HttpTransport`] for
//!   the SOAP web service, [`transport::mock::MockTransport`] for tests)
//! - **Channel**: [`ProtocolChannel`] wraps, sends, parses and checks the
//!   reply for both error shapes the server uses
//! - **XML**: an owned [`Element`] tree with typed attribute accessors
//!
//! # Example
//!
//! ```
//! use reddot_protocol::transport::mock::MockTransport;
//! use reddot_protocol::{Command, ProtocolChannel, Session};
//! use reddot_types::Guid;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let transport = Arc::new(MockTransport::always(r#"<IODATA><PAGE guid="1" headline="Home"/></IODATA>"#));
//! let channel = ProtocolChannel::new(transport, Session::new(Guid::new_v4(), "KEY"));
//!
//! let cmd = Command::new(r#"<PAGE action="load" guid="{guid}"/>"#).bind("guid", Guid::new_v4());
//! let doc = channel.execute(&cmd).await.unwrap();
//! assert_eq!(doc.first("PAGE").unwrap().attr("headline"), Some("Home"));
//! # });
//! ```

mod channel;
pub mod command;
mod error;
pub mod escape;
pub mod http;
mod session;
pub mod transport;
pub mod xml;

pub use channel::{ERROR_ELEMENT, ProtocolChannel, check_for_errors};
pub use command::{Binding, Command, SESSION_KEY_PLACEHOLDER, Wrapping};
pub use error::{ProtocolError, ProtocolResult};
pub use http::{HttpConfig, HttpTransport};
pub use session::Session;
pub use transport::Transport;
pub use xml::{Document, Element, Node};
