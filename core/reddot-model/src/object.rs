//! [`RemoteObject`]: the load-on-demand proxy for one server entity.

use crate::error::{ModelError, ModelResult};
use crate::field::LazyField;
use crate::loader::Loader;
use reddot_protocol::Element;
use reddot_types::Guid;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Attribute holding the identity on every entity element.
pub const GUID_ATTRIBUTE: &str = "guid";
/// Attribute holding the display name on named entity elements.
pub const NAME_ATTRIBUTE: &str = "name";

/// How much of an object's remote state is held locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Materialization {
    /// Only the identity is known.
    Uninitialized,
    /// Built from a list fragment; some fields may be absent.
    PartialLoaded,
    /// The full-object command succeeded; absent fields are absent remotely.
    FullyLoaded,
}

/// Anything addressable by GUID, optionally by name.
pub trait Identified {
    fn guid(&self) -> Guid;

    fn name(&self) -> Option<&str> {
        None
    }
}

impl<T: Identified + ?Sized> Identified for Arc<T> {
    fn guid(&self) -> Guid {
        (**self).guid()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

struct Inner<F> {
    state: Materialization,
    fields: F,
}

/// A local proxy for one server entity whose attributes load on demand.
///
/// State and fields sit behind one async mutex that is held across the
/// fetch, so concurrent readers of the same object share a single request.
/// Two `RemoteObject`s for the same GUID are independent.
pub struct RemoteObject<L: Loader> {
    guid: Guid,
    name: Option<String>,
    loader: L,
    inner: Mutex<Inner<L::Fields>>,
    fetches: AtomicUsize,
}

impl<L: Loader> RemoteObject<L> {
    /// An object known only by identity.
    pub fn new(guid: Guid, loader: L) -> Self {
        Self {
            guid,
            name: None,
            loader,
            inner: Mutex::new(Inner {
                state: Materialization::Uninitialized,
                fields: L::Fields::default(),
            }),
            fetches: AtomicUsize::new(0),
        }
    }

    /// An object built from a list fragment. It is `FullyLoaded` only when the
    /// loader's completeness marker is present on the element.
    pub fn from_fragment(loader: L, element: &Element) -> ModelResult<Self> {
        let guid = element
            .attr_guid(GUID_ATTRIBUTE)?
            .ok_or_else(|| ModelError::MissingAttribute {
                element: element.name().to_string(),
                attribute: GUID_ATTRIBUTE.to_string(),
            })?;

        let mut fields = L::Fields::default();
        loader.extract(element, &mut fields)?;

        let state = match loader.completeness_marker() {
            Some(marker) if element.has_attr(marker) => Materialization::FullyLoaded,
            _ => Materialization::PartialLoaded,
        };

        Ok(Self {
            guid,
            name: element.attr(NAME_ATTRIBUTE).map(str::to_string),
            loader,
            inner: Mutex::new(Inner { state, fields }),
            fetches: AtomicUsize::new(0),
        })
    }

    /// Identity of the remote entity.
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// Name captured from the fragment this object was built from.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The entity hook driving this object.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Current materialization state.
    pub async fn state(&self) -> Materialization {
        self.inner.lock().await.state
    }

    /// Number of full-object fetches this object has issued.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Loads the full representation unless it is already held.
    ///
    /// On failure state and fields are left as they were.
    pub async fn ensure_materialized(&self) -> ModelResult<()> {
        let mut inner = self.inner.lock().await;
        self.materialize(&mut inner).await
    }

    /// Returns a field, loading the full object if the field is absent.
    ///
    /// Fails with [`ModelError::MissingField`] when the server does not
    /// provide the field even after a full load.
    pub async fn read<T, F>(&self, slot: F) -> ModelResult<T>
    where
        T: Clone,
        F: Fn(&L::Fields) -> &LazyField<T> + Send,
    {
        let mut inner = self.inner.lock().await;
        if let Some(value) = slot(&inner.fields).get() {
            return Ok(value.clone());
        }
        self.materialize(&mut inner).await?;

        let field = slot(&inner.fields);
        field.get().cloned().ok_or(ModelError::MissingField {
            guid: self.guid,
            field: field.name(),
        })
    }

    /// Like [`read`](Self::read) for attributes the server may omit.
    pub async fn read_optional<T, F>(&self, slot: F) -> ModelResult<Option<T>>
    where
        T: Clone,
        F: Fn(&L::Fields) -> &LazyField<T> + Send,
    {
        let mut inner = self.inner.lock().await;
        if let Some(value) = slot(&inner.fields).get() {
            return Ok(Some(value.clone()));
        }
        self.materialize(&mut inner).await?;
        Ok(slot(&inner.fields).get().cloned())
    }

    /// Changes local fields without touching the server or the state.
    pub async fn update<R>(&self, apply: impl FnOnce(&mut L::Fields) -> R + Send) -> R {
        let mut inner = self.inner.lock().await;
        apply(&mut inner.fields)
    }

    /// Copy of the current field set.
    pub async fn fields(&self) -> L::Fields {
        self.inner.lock().await.fields.clone()
    }

    /// Drops all loaded fields; the next read fetches again.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        debug!(guid = %self.guid, element = self.loader.element_name(), "invalidated");
        inner.state = Materialization::Uninitialized;
        inner.fields = L::Fields::default();
    }

    /// Fetches the full object again, discarding local fields on success.
    pub async fn refresh(&self) -> ModelResult<()> {
        let mut inner = self.inner.lock().await;
        let fields = self.fetch_into(L::Fields::default()).await?;
        inner.fields = fields;
        inner.state = Materialization::FullyLoaded;
        Ok(())
    }

    async fn materialize(&self, inner: &mut Inner<L::Fields>) -> ModelResult<()> {
        if inner.state == Materialization::FullyLoaded {
            trace!(guid = %self.guid, "already materialized");
            return Ok(());
        }
        let fields = self.fetch_into(inner.fields.clone()).await?;
        inner.fields = fields;
        inner.state = Materialization::FullyLoaded;
        Ok(())
    }

    async fn fetch_into(&self, mut fields: L::Fields) -> ModelResult<L::Fields> {
        let element = self.loader.element_name();
        debug!(guid = %self.guid, element, "fetching full object");
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let document = self
            .loader
            .fetch_full(self.guid)
            .await
            .map_err(|source| ModelError::Fetch {
                guid: self.guid,
                element: element.to_string(),
                source,
            })?;
        let candidates = self.loader.select(&document);
        match candidates.as_slice() {
            [found] => {
                self.loader.extract(found, &mut fields)?;
                Ok(fields)
            }
            [] => Err(ModelError::EntityNotFound {
                guid: self.guid,
                element: element.to_string(),
            }),
            many => Err(ModelError::AmbiguousEntity {
                guid: self.guid,
                element: element.to_string(),
                count: many.len(),
            }),
        }
    }
}

impl<L: Loader> Identified for RemoteObject<L> {
    fn guid(&self) -> Guid {
        self.guid
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<L: Loader> fmt::Debug for RemoteObject<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObject")
            .field("element", &self.loader.element_name())
            .field("guid", &format_args!("{}", self.guid))
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
