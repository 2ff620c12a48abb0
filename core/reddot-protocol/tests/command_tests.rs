use pretty_assertions::assert_eq;
use proptest::prelude::*;
use reddot_protocol::escape::escape;
use reddot_protocol::{Binding, Command, ProtocolError, SESSION_KEY_PLACEHOLDER, Wrapping};
use reddot_types::Guid;

fn guid() -> Guid {
    Guid::parse("{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9}").unwrap()
}

// ── Escaping ─────────────────────────────────────────────────────

#[test]
fn escape_markup_characters() {
    assert_eq!(
        escape(r#"<a href="x">Tom & Jerry's</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
    );
}

#[test]
fn escape_leaves_plain_text() {
    assert_eq!(escape("Hello world äöü"), "Hello world äöü");
}

// ── Binding rendering ────────────────────────────────────────────

#[test]
fn binding_wire_forms() {
    assert_eq!(Binding::from(true).render(), "1");
    assert_eq!(Binding::from(false).render(), "0");
    assert_eq!(Binding::from(42i64).render(), "42");
    assert_eq!(Binding::from(-7i32).render(), "-7");
    assert_eq!(Binding::from(guid()).render(), "{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9}");
    assert_eq!(Binding::token("a\"b").render(), "a&quot;b");
    assert_eq!(Binding::raw("<KEYWORD/>").render(), "<KEYWORD/>");
}

#[test]
fn text_binding_is_escaped() {
    assert_eq!(Binding::from("<x>").render(), "&lt;x&gt;");
}

// ── Template rendering ───────────────────────────────────────────

#[test]
fn render_substitutes_all_placeholders() {
    let cmd = Command::new(r#"<PAGE action="save" guid="{guid}" headline="{headline}" released="{released}"/>"#)
        .bind("guid", guid())
        .bind("headline", "A \"quoted\" & <bold> headline")
        .bind("released", true);

    assert_eq!(
        cmd.render(None).unwrap(),
        r#"<PAGE action="save" guid="{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9}" headline="A &quot;quoted&quot; &amp; &lt;bold&gt; headline" released="1"/>"#
    );
}

#[test]
fn render_same_placeholder_twice() {
    let cmd = Command::new("<A x=\"{v}\">{v}</A>").bind("v", "1&2");
    assert_eq!(cmd.render(None).unwrap(), "<A x=\"1&amp;2\">1&amp;2</A>");
}

#[test]
fn rebinding_replaces_value() {
    let cmd = Command::new("{v}").bind("v", "old").bind("v", "new");
    assert_eq!(cmd.render(None).unwrap(), "new");
}

#[test]
fn raw_binding_splices_markup() {
    let items = "<KEYWORD guid=\"1\" changed=\"1\" />";
    let cmd = Command::new("<KEYWORDS>{items}</KEYWORDS>").bind("items", Binding::raw(items));
    assert_eq!(cmd.render(None).unwrap(), format!("<KEYWORDS>{items}</KEYWORDS>"));
}

#[test]
fn unbound_placeholder_is_an_error() {
    let cmd = Command::new("<PAGE guid=\"{guid}\"/>");
    let err = cmd.render(None).unwrap_err();
    assert!(matches!(err, ProtocolError::Template(ref m) if m.contains("guid")));
}

#[test]
fn doubled_braces_are_literal() {
    let cmd = Command::new("{{literal}} {v}").bind("v", "x");
    assert_eq!(cmd.render(None).unwrap(), "{literal} x");
}

#[test]
fn stray_braces_are_copied() {
    let cmd = Command::new("a { b } c {not a name}");
    assert_eq!(cmd.render(None).unwrap(), "a { b } c {not a name}");
}

#[test]
fn session_placeholder_uses_live_key() {
    let cmd = Command::new(format!("<PROJECT sessionkey=\"{{{SESSION_KEY_PLACEHOLDER}}}\"/>"));
    assert_eq!(cmd.render(Some("K&1")).unwrap(), "<PROJECT sessionkey=\"K&amp;1\"/>");
}

#[test]
fn session_placeholder_without_session_fails() {
    let cmd = Command::new("<X k=\"{session_key}\"/>");
    assert!(matches!(cmd.render(None), Err(ProtocolError::Template(_))));
}

#[test]
fn default_wrapping_is_envelope() {
    let cmd = Command::new("<X/>");
    assert_eq!(cmd.wrapping_kind(), Wrapping::Envelope);
    assert_eq!(cmd.wrapping(Wrapping::InlineProject).wrapping_kind(), Wrapping::InlineProject);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    /// Escaped text never contains raw markup characters outside entities.
    #[test]
    fn escaped_text_has_no_markup(text in ".{0,200}") {
        let escaped = escape(&text);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
        prop_assert!(!escaped.contains('\''));
    }

    /// A rendered text binding parses back to the original attribute value.
    #[test]
    fn rendered_attribute_parses_back(text in "[ -~]{0,100}") {
        let cmd = Command::new("<A v=\"{v}\"/>").bind("v", text.as_str());
        let rendered = cmd.render(None).unwrap();
        let doc = reddot_protocol::Document::parse(&rendered).unwrap();
        prop_assert_eq!(doc.root().attr("v"), Some(text.as_str()));
    }
}
