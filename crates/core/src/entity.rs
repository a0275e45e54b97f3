//! Entity trait: identity and owning book.

use crate::id::{BookId, Guid};

/// A book-scoped object with a stable identity.
pub trait Entity {
    /// Strongly-typed identifier; a thin wrapper around the object's `Guid`.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + From<Guid> + Into<Guid>;

    fn guid(&self) -> Guid;

    /// The book the object was created in; never changes.
    fn book(&self) -> BookId;

    /// Returns the typed identifier.
    fn id(&self) -> Self::Id {
        Self::Id::from(self.guid())
    }
}
