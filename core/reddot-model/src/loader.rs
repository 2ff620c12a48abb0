//! The [`Loader`] hook each entity type implements.

use crate::error::ModelResult;
use async_trait::async_trait;
use reddot_protocol::{Document, Element, ProtocolResult};
use reddot_types::Guid;

/// Entity hook for [`RemoteObject`](crate::RemoteObject).
///
/// A loader knows how to fetch the full representation of one entity type and
/// how to copy the attributes of a fragment into its field set. The same
/// `extract` runs on list fragments and on full loads, so it must only touch
/// the fields the element actually carries (see
/// [`LazyField::init_if_present`](crate::LazyField::init_if_present)).
#[async_trait]
pub trait Loader: Send + Sync {
    /// Field set of the entity, every slot absent in `Default`.
    type Fields: Default + Clone + Send + Sync;

    /// Element name of the entity in replies (`PAGE`, `FOLDER`, ...).
    fn element_name(&self) -> &str;

    /// Attribute whose presence on a fragment means it is a complete
    /// representation. `None` means fragments are never complete.
    fn completeness_marker(&self) -> Option<&str> {
        None
    }

    /// Issues the full-object command for `guid`.
    async fn fetch_full(&self, guid: Guid) -> ProtocolResult<Document>;

    /// Candidate elements of a full-load reply. Materialization requires
    /// exactly one.
    fn select<'d>(&self, document: &'d Document) -> Vec<&'d Element> {
        document.elements_by_name(self.element_name())
    }

    /// Copies the attributes present on `element` into `fields`.
    fn extract(&self, element: &Element, fields: &mut Self::Fields) -> ModelResult<()>;
}
