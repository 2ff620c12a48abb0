//! HTTP transport talking to the RQL web service.
//!
//! Each request is wrapped in a SOAP 1.1 `ExecuteString` call; the RQL reply
//! is the text of the `ExecuteStringResult` element.

use crate::error::{ProtocolError, ProtocolResult};
use crate::escape::escape;
use crate::transport::Transport;
use crate::xml::Document;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Server root, e.g. `https://cms.example.com`.
    pub base_url: String,
    /// Path of the web service below `base_url`.
    pub endpoint: String,
    /// SOAPAction header value.
    pub soap_action: String,
    /// Request timeout (ms). The channel itself imposes none.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            endpoint: "/CMS/WebService/RqlWebService.svc".to_string(),
            soap_action: "http://tempuri.org/RqlWebService/ExecuteString".to_string(),
            timeout_ms: 60_000,
            user_agent: concat!("reddot-protocol/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Loads a config from JSON. Missing keys take their default.
    pub fn from_json(json: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Full URL of the web service.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

/// Sends RQL over HTTP/SOAP.
pub struct HttpTransport {
    config: HttpConfig,
    client: Client,
}

impl HttpTransport {
    /// Builds the HTTP client for `config`.
    pub fn new(config: HttpConfig) -> ProtocolResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

/// Wraps an RQL request in the SOAP envelope.
pub fn soap_envelope(request: &str) -> String {
    format!(
        concat!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<s:Body><ExecuteString xmlns="http://tempuri.org/">"#,
            "<command>{}</command>",
            "</ExecuteString></s:Body></s:Envelope>"
        ),
        escape(request)
    )
}

/// Extracts the RQL reply from a SOAP response body.
///
/// A SOAP fault is a rejection by the server, not a transport problem.
pub fn unwrap_soap_reply(body: &str) -> ProtocolResult<String> {
    let doc = Document::parse(body)?;
    if let Some(fault) = doc.first("Fault") {
        let reason = fault
            .find("faultstring")
            .map(|e| e.inner_text())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "SOAP fault".to_string());
        return Err(ProtocolError::RemoteCallFailed {
            reason: reason.trim().to_string(),
        });
    }
    doc.first("ExecuteStringResult")
        .map(|e| e.inner_text())
        .ok_or_else(|| {
            ProtocolError::MalformedResponse("SOAP reply has no ExecuteStringResult".into())
        })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &str) -> ProtocolResult<String> {
        let url = self.config.url();
        debug!(%url, bytes = request.len(), "posting RQL request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"))
            .header("SOAPAction", format!("\"{}\"", self.config.soap_action))
            .body(soap_envelope(request))
            .send()
            .await
            .map_err(|e| ProtocolError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProtocolError::Transport(format!("reading reply from {url}: {e}")))?;

        if status.is_success() {
            return unwrap_soap_reply(&body);
        }

        warn!(%url, %status, "RQL web service returned an error status");
        match unwrap_soap_reply(&body) {
            Err(fault @ ProtocolError::RemoteCallFailed { .. }) => Err(fault),
            _ => Err(ProtocolError::Transport(format!("HTTP {status} from {url}"))),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
