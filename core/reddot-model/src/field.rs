//! [`LazyField`] slots and the parsers used to fill them from fragments.

use crate::error::{ModelError, ModelResult};
use reddot_protocol::Element;

/// One attribute of a remote object: either present or not yet fetched.
///
/// Field sets are plain structs of `LazyField`s with a `Default` impl that
/// names every slot, e.g.
///
/// ```
/// use reddot_model::LazyField;
///
/// #[derive(Clone)]
/// struct PageFields {
///     headline: LazyField<String>,
///     id: LazyField<i64>,
/// }
///
/// impl Default for PageFields {
///     fn default() -> Self {
///         Self {
///             headline: LazyField::new("headline"),
///             id: LazyField::new("id"),
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyField<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> LazyField<T> {
    /// An absent field; `name` appears in [`ModelError::MissingField`].
    pub const fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }

    /// Attribute name of the field.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The value, if fetched.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// True once a value has been fetched or set.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Stores `value`, replacing any previous one.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Marks the field as not fetched.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Removes and returns the value, leaving the field absent.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Sets the value when `value` is `Some`, keeps the current one otherwise.
    pub fn init_from(&mut self, value: Option<T>) {
        if let Some(v) = value {
            self.value = Some(v);
        }
    }

    /// Sets the field from `attribute` if the element carries it.
    pub fn init_if_present<F>(&mut self, element: &Element, attribute: &str, parse: F) -> ModelResult<()>
    where
        F: FnOnce(&str) -> ModelResult<T>,
    {
        if let Some(raw) = element.attr(attribute) {
            self.value = Some(parse(raw)?);
        }
        Ok(())
    }

    /// Sets the field from `attribute`, which the element must carry.
    pub fn ensured<F>(&mut self, element: &Element, attribute: &str, parse: F) -> ModelResult<()>
    where
        F: FnOnce(&str) -> ModelResult<T>,
    {
        let raw = element
            .attr(attribute)
            .ok_or_else(|| ModelError::MissingAttribute {
                element: element.name().to_string(),
                attribute: attribute.to_string(),
            })?;
        self.value = Some(parse(raw)?);
        Ok(())
    }
}

/// Parser for [`LazyField::init_if_present`] that keeps the text.
pub fn text(raw: &str) -> ModelResult<String> {
    Ok(raw.to_string())
}

/// Builds an [`ModelError::InvalidAttribute`] for `element`.
pub fn invalid(element: &Element, attribute: &str, value: &str) -> ModelError {
    ModelError::InvalidAttribute {
        element: element.name().to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}
