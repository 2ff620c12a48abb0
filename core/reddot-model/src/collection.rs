//! Lazily produced, optionally cached collections of remote entities.
//!
//! A collection wraps a [`Produce`] implementation that builds the element
//! list from the server. With [`Caching::Enabled`] the first successful
//! production is kept until [`CachedCollection::invalidate_cache`]; with
//! [`Caching::Disabled`] every access produces again.
//!
//! Entities expose their child lists through [`RemoteCollection`] /
//! [`NameIndexed`] so that a remote list and an [`EmptyCollection`] can sit
//! behind the same field type.

use crate::error::{ModelError, ModelResult};
use crate::object::Identified;
use async_trait::async_trait;
use reddot_protocol::{Command, Element, ProtocolChannel};
use reddot_types::Guid;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Whether a collection keeps its last production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Caching {
    #[default]
    Enabled,
    Disabled,
}

/// Builds the element list of a collection.
#[async_trait]
pub trait Produce<T>: Send + Sync {
    async fn produce(&self) -> ModelResult<Vec<T>>;
}

/// [`Produce`] adapter for an async closure. Built with [`from_fn`].
pub struct FnProducer<F>(F);

/// Wraps `f` as a producer.
pub fn from_fn<F, Fut, T>(f: F) -> FnProducer<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ModelResult<Vec<T>>> + Send,
{
    FnProducer(f)
}

#[async_trait]
impl<T, F, Fut> Produce<T> for FnProducer<F>
where
    T: Send,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ModelResult<Vec<T>>> + Send,
{
    async fn produce(&self) -> ModelResult<Vec<T>> {
        (self.0)().await
    }
}

type Construct<T> = dyn Fn(&Element) -> ModelResult<Option<T>> + Send + Sync;

/// Producer that runs one list command and turns every `element` in the reply
/// into an item. The constructor returns `Ok(None)` for fragments it does not
/// know, which are skipped.
pub struct FragmentQuery<T> {
    channel: Arc<ProtocolChannel>,
    command: Command,
    element: String,
    construct: Box<Construct<T>>,
}

impl<T> FragmentQuery<T> {
    /// A query that runs `command` and builds an item from every `element`.
    pub fn new<F>(
        channel: Arc<ProtocolChannel>,
        command: Command,
        element: impl Into<String>,
        construct: F,
    ) -> Self
    where
        F: Fn(&Element) -> ModelResult<Option<T>> + Send + Sync + 'static,
    {
        Self {
            channel,
            command,
            element: element.into(),
            construct: Box::new(construct),
        }
    }

    /// The list command this query runs.
    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[async_trait]
impl<T: Send> Produce<T> for FragmentQuery<T> {
    async fn produce(&self) -> ModelResult<Vec<T>> {
        let document =
            self.channel
                .execute(&self.command)
                .await
                .map_err(|source| ModelError::Query {
                    element: self.element.clone(),
                    source,
                })?;
        let fragments = document.elements_by_name(&self.element);
        let mut items = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            match (self.construct)(fragment)? {
                Some(item) => items.push(item),
                None => trace!(element = %self.element, "skipped unknown fragment"),
            }
        }
        Ok(items)
    }
}

/// One production with its lookup indexes. Duplicate keys resolve to the
/// first element in production order.
struct Snapshot<T> {
    items: Arc<[T]>,
    by_guid: HashMap<Guid, usize>,
    by_name: HashMap<String, usize>,
}

impl<T: Identified> Snapshot<T> {
    fn build(items: Vec<T>, index_names: bool) -> Self {
        let mut by_guid = HashMap::with_capacity(items.len());
        let mut by_name = HashMap::new();
        for (index, item) in items.iter().enumerate() {
            by_guid.entry(item.guid()).or_insert(index);
            if !index_names {
                continue;
            }
            if let Some(name) = item.name() {
                by_name.entry(name.to_string()).or_insert(index);
            }
        }
        Self {
            items: items.into(),
            by_guid,
            by_name,
        }
    }

    fn by_guid(&self, guid: Guid) -> Option<&T> {
        self.by_guid.get(&guid).map(|&i| &self.items[i])
    }

    fn by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).map(|&i| &self.items[i])
    }
}

/// Read surface shared by every collection variant.
#[async_trait]
pub trait RemoteCollection<T>: Send + Sync {
    async fn get(&self) -> ModelResult<Arc<[T]>>;

    async fn invalidate_cache(&self);

    async fn get_by_guid(&self, guid: Guid) -> ModelResult<T>;

    async fn try_get_by_guid(&self, guid: Guid) -> ModelResult<Option<T>>;

    async fn contains_guid(&self, guid: Guid) -> ModelResult<bool>;

    async fn refresh(&self) -> ModelResult<Arc<[T]>>;
}

/// Name lookups on top of [`RemoteCollection`].
#[async_trait]
pub trait NameIndexed<T>: RemoteCollection<T> {
    async fn get_by_name(&self, name: &str) -> ModelResult<T>;

    async fn try_get_by_name(&self, name: &str) -> ModelResult<Option<T>>;
}

/// A collection produced on first access and cached per [`Caching`].
///
/// Production holds the cache lock, so concurrent first reads share one
/// production. A failed production leaves the cache as it was.
pub struct CachedCollection<T> {
    producer: Box<dyn Produce<T>>,
    caching: Caching,
    cache: Mutex<Option<Arc<Snapshot<T>>>>,
    productions: AtomicUsize,
    index_names: bool,
}

impl<T> CachedCollection<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    /// A collection over `producer`; nothing is fetched until first access.
    pub fn new(producer: impl Produce<T> + 'static, caching: Caching) -> Self {
        Self::with_name_index(producer, caching, false)
    }

    fn with_name_index(
        producer: impl Produce<T> + 'static,
        caching: Caching,
        index_names: bool,
    ) -> Self {
        Self {
            producer: Box::new(producer),
            caching,
            cache: Mutex::new(None),
            productions: AtomicUsize::new(0),
            index_names,
        }
    }

    /// Caching policy fixed at construction.
    pub fn caching(&self) -> Caching {
        self.caching
    }

    /// Number of times the producer has run.
    pub fn production_count(&self) -> usize {
        self.productions.load(Ordering::Relaxed)
    }

    /// Elements in server order, produced on first access when caching.
    pub async fn get(&self) -> ModelResult<Arc<[T]>> {
        Ok(self.snapshot().await?.items.clone())
    }

    /// Drops the cached production; the next access produces again.
    pub async fn invalidate_cache(&self) {
        debug!("collection cache invalidated");
        *self.cache.lock().await = None;
    }

    /// First element with `guid`, or [`ModelError::NotFound`].
    pub async fn get_by_guid(&self, guid: Guid) -> ModelResult<T> {
        self.try_get_by_guid(guid)
            .await?
            .ok_or_else(|| ModelError::not_found_guid(guid))
    }

    pub async fn try_get_by_guid(&self, guid: Guid) -> ModelResult<Option<T>> {
        Ok(self.snapshot().await?.by_guid(guid).cloned())
    }

    pub async fn contains_guid(&self, guid: Guid) -> ModelResult<bool> {
        Ok(self.snapshot().await?.by_guid.contains_key(&guid))
    }

    /// Produces again and replaces the cache.
    pub async fn refresh(&self) -> ModelResult<Arc<[T]>> {
        let mut cache = self.cache.lock().await;
        let snapshot = self.produce().await?;
        if self.caching == Caching::Enabled {
            *cache = Some(snapshot.clone());
        }
        Ok(snapshot.items.clone())
    }

    async fn snapshot(&self) -> ModelResult<Arc<Snapshot<T>>> {
        let mut cache = self.cache.lock().await;
        if self.caching == Caching::Enabled {
            if let Some(snapshot) = cache.as_ref() {
                trace!(len = snapshot.items.len(), "collection cache hit");
                return Ok(snapshot.clone());
            }
        }
        let snapshot = self.produce().await?;
        if self.caching == Caching::Enabled {
            *cache = Some(snapshot.clone());
        }
        Ok(snapshot)
    }

    async fn produce(&self) -> ModelResult<Arc<Snapshot<T>>> {
        self.productions.fetch_add(1, Ordering::Relaxed);
        let items = self.producer.produce().await?;
        debug!(len = items.len(), caching = ?self.caching, "collection produced");
        Ok(Arc::new(Snapshot::build(items, self.index_names)))
    }
}

#[async_trait]
impl<T> RemoteCollection<T> for CachedCollection<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    async fn get(&self) -> ModelResult<Arc<[T]>> {
        CachedCollection::get(self).await
    }

    async fn invalidate_cache(&self) {
        CachedCollection::invalidate_cache(self).await
    }

    async fn get_by_guid(&self, guid: Guid) -> ModelResult<T> {
        CachedCollection::get_by_guid(self, guid).await
    }

    async fn try_get_by_guid(&self, guid: Guid) -> ModelResult<Option<T>> {
        CachedCollection::try_get_by_guid(self, guid).await
    }

    async fn contains_guid(&self, guid: Guid) -> ModelResult<bool> {
        CachedCollection::contains_guid(self, guid).await
    }

    async fn refresh(&self) -> ModelResult<Arc<[T]>> {
        CachedCollection::refresh(self).await
    }
}

/// A [`CachedCollection`] whose elements are also looked up by name.
pub struct NameIndexedCollection<T> {
    inner: CachedCollection<T>,
}

impl<T> NameIndexedCollection<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    /// A collection over `producer` that also indexes elements by name.
    pub fn new(producer: impl Produce<T> + 'static, caching: Caching) -> Self {
        Self {
            inner: CachedCollection::with_name_index(producer, caching, true),
        }
    }

    /// The underlying cached collection.
    pub fn collection(&self) -> &CachedCollection<T> {
        &self.inner
    }

    pub fn production_count(&self) -> usize {
        self.inner.production_count()
    }

    pub async fn get(&self) -> ModelResult<Arc<[T]>> {
        self.inner.get().await
    }

    pub async fn invalidate_cache(&self) {
        self.inner.invalidate_cache().await
    }

    pub async fn get_by_guid(&self, guid: Guid) -> ModelResult<T> {
        self.inner.get_by_guid(guid).await
    }

    pub async fn try_get_by_guid(&self, guid: Guid) -> ModelResult<Option<T>> {
        self.inner.try_get_by_guid(guid).await
    }

    pub async fn contains_guid(&self, guid: Guid) -> ModelResult<bool> {
        self.inner.contains_guid(guid).await
    }

    pub async fn refresh(&self) -> ModelResult<Arc<[T]>> {
        self.inner.refresh().await
    }

    /// First element named `name`, or [`ModelError::NotFound`].
    pub async fn get_by_name(&self, name: &str) -> ModelResult<T> {
        self.try_get_by_name(name)
            .await?
            .ok_or_else(|| ModelError::not_found_name(name))
    }

    pub async fn try_get_by_name(&self, name: &str) -> ModelResult<Option<T>> {
        Ok(self.inner.snapshot().await?.by_name(name).cloned())
    }
}

#[async_trait]
impl<T> RemoteCollection<T> for NameIndexedCollection<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    async fn get(&self) -> ModelResult<Arc<[T]>> {
        self.inner.get().await
    }

    async fn invalidate_cache(&self) {
        self.inner.invalidate_cache().await
    }

    async fn get_by_guid(&self, guid: Guid) -> ModelResult<T> {
        self.inner.get_by_guid(guid).await
    }

    async fn try_get_by_guid(&self, guid: Guid) -> ModelResult<Option<T>> {
        self.inner.try_get_by_guid(guid).await
    }

    async fn contains_guid(&self, guid: Guid) -> ModelResult<bool> {
        self.inner.contains_guid(guid).await
    }

    async fn refresh(&self) -> ModelResult<Arc<[T]>> {
        self.inner.refresh().await
    }
}

#[async_trait]
impl<T> NameIndexed<T> for NameIndexedCollection<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    async fn get_by_name(&self, name: &str) -> ModelResult<T> {
        NameIndexedCollection::get_by_name(self, name).await
    }

    async fn try_get_by_name(&self, name: &str) -> ModelResult<Option<T>> {
        NameIndexedCollection::try_get_by_name(self, name).await
    }
}

/// A collection that is always empty and never contacts the server.
pub struct EmptyCollection<T>(PhantomData<fn() -> T>);

impl<T> EmptyCollection<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for EmptyCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> RemoteCollection<T> for EmptyCollection<T> {
    async fn get(&self) -> ModelResult<Arc<[T]>> {
        Ok(Arc::from(Vec::new()))
    }

    async fn invalidate_cache(&self) {}

    async fn get_by_guid(&self, guid: Guid) -> ModelResult<T> {
        Err(ModelError::not_found_guid(guid))
    }

    async fn try_get_by_guid(&self, _guid: Guid) -> ModelResult<Option<T>> {
        Ok(None)
    }

    async fn contains_guid(&self, _guid: Guid) -> ModelResult<bool> {
        Ok(false)
    }

    async fn refresh(&self) -> ModelResult<Arc<[T]>> {
        Ok(Arc::from(Vec::new()))
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> NameIndexed<T> for EmptyCollection<T> {
    async fn get_by_name(&self, name: &str) -> ModelResult<T> {
        Err(ModelError::not_found_name(name))
    }

    async fn try_get_by_name(&self, _name: &str) -> ModelResult<Option<T>> {
        Ok(None)
    }
}
