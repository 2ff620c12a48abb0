use reddot_protocol::http::{soap_envelope, unwrap_soap_reply};
use reddot_protocol::{
    Command, HttpConfig, HttpTransport, ProtocolChannel, ProtocolError, Session, Transport,
};
use reddot_types::Guid;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn soap_reply(rql: &str) -> String {
    let escaped = rql.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><ExecuteStringResponse xmlns="http://tempuri.org/"><ExecuteStringResult>{escaped}</ExecuteStringResult></ExecuteStringResponse></s:Body></s:Envelope>"#
    )
}

const SOAP_FAULT: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>Invalid session key</faultstring></s:Fault></s:Body></s:Envelope>"#;

fn config_for(server: &MockServer) -> HttpConfig {
    HttpConfig {
        base_url: server.uri(),
        timeout_ms: 5_000,
        ..Default::default()
    }
}

// ── Config ───────────────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = HttpConfig::default();
    assert_eq!(cfg.endpoint, "/CMS/WebService/RqlWebService.svc");
    assert_eq!(cfg.timeout_ms, 60_000);
    assert!(cfg.user_agent.starts_with("reddot-protocol/"));
}

#[test]
fn config_from_partial_json() {
    let cfg = HttpConfig::from_json(r#"{"base_url": "https://cms.example.com/", "timeout_ms": 1000}"#).unwrap();
    assert_eq!(cfg.base_url, "https://cms.example.com/");
    assert_eq!(cfg.timeout_ms, 1000);
    assert_eq!(cfg.url(), "https://cms.example.com/CMS/WebService/RqlWebService.svc");
}

#[test]
fn config_from_bad_json() {
    assert!(matches!(HttpConfig::from_json("{"), Err(ProtocolError::Config(_))));
}

#[test]
fn config_serde_roundtrip() {
    let cfg = HttpConfig {
        base_url: "https://a".into(),
        ..Default::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(HttpConfig::from_json(&json).unwrap(), cfg);
}

// ── SOAP framing ─────────────────────────────────────────────────

#[test]
fn envelope_escapes_request() {
    let body = soap_envelope("<IODATA><PAGE/></IODATA>");
    assert!(body.contains("<command>&lt;IODATA&gt;&lt;PAGE/&gt;&lt;/IODATA&gt;</command>"));
}

#[test]
fn unwrap_reply_returns_rql_text() {
    let rql = unwrap_soap_reply(&soap_reply("<IODATA><PAGE/></IODATA>")).unwrap();
    assert_eq!(rql, "<IODATA><PAGE/></IODATA>");
}

#[test]
fn unwrap_fault_is_remote_failure() {
    let err = unwrap_soap_reply(SOAP_FAULT).unwrap_err();
    assert_eq!(err.remote_reason(), Some("Invalid session key"));
}

#[test]
fn unwrap_without_result_is_malformed() {
    let err = unwrap_soap_reply("<Envelope><Body/></Envelope>").unwrap_err();
    assert!(matches!(err, ProtocolError::MalformedResponse(_)));
}

// ── Transport against a mock server ──────────────────────────────

#[tokio::test]
async fn posts_soap_and_returns_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CMS/WebService/RqlWebService.svc"))
        .and(header("SOAPAction", "\"http://tempuri.org/RqlWebService/ExecuteString\""))
        .and(body_string_contains("ExecuteString"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_reply(
            r#"<IODATA><PAGE guid="0A1B2C3D4E5F60718293A4B5C6D7E8F9" headline="Home"/></IODATA>"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let transport = Arc::new(HttpTransport::new(config_for(&server)).unwrap());
    assert_eq!(transport.name(), "http");
    let channel = ProtocolChannel::new(transport, Session::new(Guid::new_v4(), "KEY"));

    let cmd = Command::new(r#"<PAGE action="load" guid="{guid}"/>"#).bind("guid", Guid::new_v4());
    let doc = channel.execute(&cmd).await.unwrap();
    assert_eq!(doc.first("PAGE").unwrap().attr("headline"), Some("Home"));
}

#[tokio::test]
async fn error_marker_inside_soap_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_reply("<IODATA><ERROR>E1</ERROR></IODATA>")))
        .mount(&server)
        .await;

    let transport = Arc::new(HttpTransport::new(config_for(&server)).unwrap());
    let channel = ProtocolChannel::new(transport, Session::new(Guid::new_v4(), "KEY"));
    let err = channel.execute(&Command::new("<PAGE/>")).await.unwrap_err();
    assert_eq!(err.remote_reason(), Some("E1"));
}

#[tokio::test]
async fn soap_fault_with_500_is_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(SOAP_FAULT))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(config_for(&server)).unwrap();
    let err = transport.send("<IODATA/>").await.unwrap_err();
    assert_eq!(err.remote_reason(), Some("Invalid session key"));
}

#[tokio::test]
async fn plain_http_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(config_for(&server)).unwrap();
    let err = transport.send("<IODATA/>").await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn connection_refused_is_transport() {
    let config = HttpConfig {
        base_url: "http://127.0.0.1:1".into(),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let transport = HttpTransport::new(config).unwrap();
    let err = transport.send("<IODATA/>").await.unwrap_err();
    assert!(err.is_transport());
}
