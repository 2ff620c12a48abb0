//! Lazy-loading object model for RedDot RQL clients.
//!
//! - [`RemoteObject`]: a local proxy for one server entity, driven by a
//!   [`Loader`] through `Uninitialized → PartialLoaded → FullyLoaded`
//! - [`LazyField`]: one attribute slot, present or not yet fetched
//! - [`CachedCollection`] / [`NameIndexedCollection`] / [`EmptyCollection`]:
//!   lazily produced entity lists with GUID and name lookup
//! - [`TypeRegistry`]: wire type tag to constructor, filled once at startup
//!
//! All server traffic goes through a shared
//! [`ProtocolChannel`](reddot_protocol::ProtocolChannel); nothing here
//! retries or swallows channel errors.

pub mod collection;
mod error;
pub mod field;
mod loader;
mod object;
mod registry;

pub use collection::{
    CachedCollection, Caching, EmptyCollection, FragmentQuery, NameIndexed,
    NameIndexedCollection, Produce, RemoteCollection,
};
pub use error::{ModelError, ModelResult};
pub use field::LazyField;
pub use loader::Loader;
pub use object::{GUID_ATTRIBUTE, Identified, Materialization, NAME_ATTRIBUTE, RemoteObject};
pub use registry::{Constructor, TypeRegistry};
