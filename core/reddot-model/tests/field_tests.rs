use reddot_model::field::{invalid, text};
use reddot_model::{LazyField, ModelError, ModelResult};
use reddot_protocol::Element;

fn page() -> Element {
    Element::new("PAGE")
        .with_attr("headline", "Home")
        .with_attr("id", "7")
        .with_attr("flags", "")
}

fn parse_id(element: &Element) -> impl FnOnce(&str) -> ModelResult<i64> + '_ {
    move |raw| raw.parse().map_err(|_| invalid(element, "id", raw))
}

// ── Slot state ───────────────────────────────────────────────────

#[test]
fn new_field_is_absent() {
    let f: LazyField<String> = LazyField::new("headline");
    assert_eq!(f.name(), "headline");
    assert!(!f.is_present());
    assert_eq!(f.get(), None);
}

#[test]
fn set_clear_take() {
    let mut f = LazyField::new("id");
    f.set(1);
    assert_eq!(f.get(), Some(&1));
    f.clear();
    assert!(!f.is_present());
    f.set(2);
    assert_eq!(f.take(), Some(2));
    assert!(!f.is_present());
}

#[test]
fn init_from_keeps_current_value_on_none() {
    let mut f = LazyField::new("id");
    f.set(1);
    f.init_from(None);
    assert_eq!(f.get(), Some(&1));
    f.init_from(Some(5));
    assert_eq!(f.get(), Some(&5));
}

// ── Extraction helpers ───────────────────────────────────────────

#[test]
fn init_if_present_reads_attribute() {
    let element = page();
    let mut f = LazyField::new("headline");
    f.init_if_present(&element, "headline", text).unwrap();
    assert_eq!(f.get().map(String::as_str), Some("Home"));
}

#[test]
fn init_if_present_skips_missing_attribute() {
    let element = page();
    let mut f = LazyField::new("status");
    f.set("kept".to_string());
    f.init_if_present(&element, "status", text).unwrap();
    assert_eq!(f.get().map(String::as_str), Some("kept"));
}

#[test]
fn init_if_present_keeps_empty_value() {
    let element = page();
    let mut f = LazyField::new("flags");
    f.init_if_present(&element, "flags", text).unwrap();
    assert_eq!(f.get().map(String::as_str), Some(""));
}

#[test]
fn ensured_parses_value() {
    let element = page();
    let mut f = LazyField::new("id");
    f.ensured(&element, "id", parse_id(&element)).unwrap();
    assert_eq!(f.get(), Some(&7));
}

#[test]
fn ensured_fails_on_missing_attribute() {
    let element = page();
    let mut f: LazyField<String> = LazyField::new("status");
    let err = f.ensured(&element, "status", text).unwrap_err();
    match err {
        ModelError::MissingAttribute { element, attribute } => {
            assert_eq!(element, "PAGE");
            assert_eq!(attribute, "status");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!f.is_present());
}

#[test]
fn parse_failure_leaves_field_untouched() {
    let element = Element::new("PAGE").with_attr("id", "seven");
    let mut f = LazyField::new("id");
    f.set(1);
    let err = f.init_if_present(&element, "id", parse_id(&element)).unwrap_err();
    assert!(matches!(err, ModelError::InvalidAttribute { ref value, .. } if value == "seven"));
    assert_eq!(f.get(), Some(&1));
}
