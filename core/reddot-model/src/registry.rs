//! Static type-tag dispatch for building items from fragments.

use crate::error::{ModelError, ModelResult};
use reddot_protocol::Element;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;
use tracing::trace;

/// Builds an item from a fragment whose type tag selected it.
pub type Constructor<T> = fn(&Element) -> ModelResult<T>;

/// Maps a wire type tag to a constructor.
///
/// The tag is read from one attribute of each fragment (e.g. `elttype` on
/// page elements) and parsed as `K`. Registries are meant to be filled once
/// and then shared, typically from a `static` `LazyLock`.
pub struct TypeRegistry<K, T> {
    attribute: &'static str,
    constructors: HashMap<K, Constructor<T>>,
}

impl<K, T> TypeRegistry<K, T>
where
    K: FromStr + Eq + Hash + Display,
{
    /// An empty registry reading tags from `attribute`.
    pub fn new(attribute: &'static str) -> Self {
        Self {
            attribute,
            constructors: HashMap::new(),
        }
    }

    /// Attribute the tag is read from.
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    /// Number of registered tags, aliases included.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// True if `tag` has a constructor.
    pub fn is_registered(&self, tag: &K) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Adds a constructor for `tag`. Fails with
    /// [`ModelError::DuplicateTypeTag`] if the tag is taken.
    pub fn register(&mut self, tag: K, constructor: Constructor<T>) -> ModelResult<()> {
        if self.constructors.contains_key(&tag) {
            return Err(ModelError::DuplicateTypeTag(tag.to_string()));
        }
        self.constructors.insert(tag, constructor);
        Ok(())
    }

    /// Registers `alias` with the constructor already registered for `target`.
    pub fn alias(&mut self, alias: K, target: &K) -> ModelResult<()> {
        let constructor = *self
            .constructors
            .get(target)
            .ok_or_else(|| ModelError::UnknownTypeTag(target.to_string()))?;
        self.register(alias, constructor)
    }

    /// Tag carried by `element`. Text that does not parse as `K` is an
    /// unknown tag.
    pub fn tag_of(&self, element: &Element) -> ModelResult<K> {
        let raw = element
            .attr(self.attribute)
            .ok_or_else(|| ModelError::MissingAttribute {
                element: element.name().to_string(),
                attribute: self.attribute.to_string(),
            })?;
        raw.parse()
            .map_err(|_| ModelError::UnknownTypeTag(raw.to_string()))
    }

    /// Builds the item for `element`'s tag. Fails with
    /// [`ModelError::UnknownTypeTag`] for tags without a constructor.
    pub fn create(&self, element: &Element) -> ModelResult<T> {
        self.try_create(element)?.ok_or_else(|| {
            let raw = element.attr(self.attribute).unwrap_or_default();
            ModelError::UnknownTypeTag(raw.to_string())
        })
    }

    /// Like [`create`](Self::create) but an unknown tag yields `Ok(None)`.
    pub fn try_create(&self, element: &Element) -> ModelResult<Option<T>> {
        let tag = match self.tag_of(element) {
            Ok(tag) => tag,
            Err(ModelError::UnknownTypeTag(raw)) => {
                trace!(attribute = self.attribute, tag = %raw, "unknown type tag");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match self.constructors.get(&tag) {
            Some(constructor) => constructor(element).map(Some),
            None => {
                trace!(attribute = self.attribute, %tag, "unregistered type tag");
                Ok(None)
            }
        }
    }
}
