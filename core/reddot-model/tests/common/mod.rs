//! Shared fixtures for model tests: a page-like entity over a mock channel.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reddot_model::field::{invalid, text};
use reddot_model::{LazyField, Loader, ModelResult, RemoteObject};
use reddot_protocol::transport::mock::MockTransport;
use reddot_protocol::{Command, Document, Element, ProtocolChannel, ProtocolResult, Session};
use reddot_types::Guid;
use std::sync::Arc;

pub const PAGE_GUID: &str = "0A1B2C3D4E5F60718293A4B5C6D7E8F9";

pub fn page_guid() -> Guid {
    Guid::parse_lenient(PAGE_GUID).unwrap()
}

pub fn channel(mock: &Arc<MockTransport>) -> Arc<ProtocolChannel> {
    Arc::new(ProtocolChannel::new(
        mock.clone(),
        Session::new(Guid::from_u128(0xABCD), "KEY"),
    ))
}

#[derive(Debug, Clone)]
pub struct PageFields {
    pub headline: LazyField<String>,
    pub id: LazyField<i64>,
    pub changed: LazyField<NaiveDateTime>,
    pub status: LazyField<String>,
}

impl Default for PageFields {
    fn default() -> Self {
        Self {
            headline: LazyField::new("headline"),
            id: LazyField::new("id"),
            changed: LazyField::new("changedate"),
            status: LazyField::new("status"),
        }
    }
}

/// Loads `<PAGE>` elements. Pages are never complete from a list fragment
/// unless a marker is configured.
pub struct PageLoader {
    pub channel: Arc<ProtocolChannel>,
    pub marker: Option<&'static str>,
}

impl PageLoader {
    pub fn new(channel: Arc<ProtocolChannel>) -> Self {
        Self {
            channel,
            marker: None,
        }
    }
}

#[async_trait]
impl Loader for PageLoader {
    type Fields = PageFields;

    fn element_name(&self) -> &str {
        "PAGE"
    }

    fn completeness_marker(&self) -> Option<&str> {
        self.marker
    }

    async fn fetch_full(&self, guid: Guid) -> ProtocolResult<Document> {
        let cmd = Command::new(r#"<PAGE action="load" guid="{guid}"/>"#).bind("guid", guid);
        self.channel.execute(&cmd).await
    }

    fn extract(&self, element: &Element, fields: &mut PageFields) -> ModelResult<()> {
        fields.headline.init_if_present(element, "headline", text)?;
        fields.id.init_if_present(element, "id", |raw| {
            raw.parse().map_err(|_| invalid(element, "id", raw))
        })?;
        fields.changed.init_from(element.attr_oa_date("changedate")?);
        fields.status.init_if_present(element, "status", text)?;
        Ok(())
    }
}

pub type Page = RemoteObject<PageLoader>;

pub fn full_page_reply(headline: &str) -> String {
    format!(
        r#"<IODATA><PAGE guid="{PAGE_GUID}" id="42" headline="{headline}" changedate="45000.5"/></IODATA>"#
    )
}

pub fn fragment(xml: &str) -> Element {
    Document::parse(&format!("<IODATA>{xml}</IODATA>"))
        .unwrap()
        .into_root()
        .children()
        .next()
        .unwrap()
        .clone()
}

/// Routes `tracing` output to the test harness; set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
