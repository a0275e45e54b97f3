//! The contract every book-managed business object implements.

use std::collections::HashMap;

use serde::Serialize;

use bizbook_core::{Entity, Guid};

use crate::ids::JobId;
use crate::instance::Instance;
use crate::owner::Owner;

mod sealed {
    /// Unlocks the mutating hooks of [`super::BusinessObject`] and
    /// [`super::Stores`]. Only this crate can construct one.
    #[derive(Debug, Copy, Clone)]
    pub struct Token(pub(in crate::object) ());
}

pub(crate) use sealed::Token;

pub(crate) const TOKEN: Token = Token(());

/// A mutable business object living in a [`crate::Book`].
///
/// Attribute setters live on the object's book-issued edit handle
/// (`JobMut`, `CustomerMut`, ...); each one applies the value and marks the
/// instance dirty. Construction, session transitions and rollback restores
/// are reserved to the book.
pub trait BusinessObject: Entity + Clone + Serialize + core::fmt::Debug {
    /// Stable type name reported to backends.
    const TYPE_NAME: &'static str;

    /// Transactional bookkeeping (identity, owning book, dirty flag, depth).
    fn instance(&self) -> &Instance;

    fn is_active(&self) -> bool;

    /// Human-readable label.
    fn printable(&self) -> String;

    /// The party this object belongs to, if any.
    fn owner(&self) -> Option<Owner> {
        None
    }

    /// Jobs linked to this object when it acts as a party.
    fn linked_jobs(&self) -> Vec<JobId> {
        Vec::new()
    }

    #[doc(hidden)]
    fn create(instance: Instance, token: Token) -> Self;

    #[doc(hidden)]
    fn instance_mut(&mut self, token: Token) -> &mut Instance;

    #[doc(hidden)]
    fn set_active(&mut self, active: bool, token: Token);

    /// Restore attributes from a rollback snapshot.
    ///
    /// The live edit-session state is kept; parties override this to keep
    /// their membership index, which is not part of the session.
    #[doc(hidden)]
    fn restore_from(&mut self, snapshot: Self, token: Token)
    where
        Self: Sized,
    {
        let instance = self.instance().clone();
        *self = snapshot;
        *self.instance_mut(token) = instance;
    }
}

/// Live objects of one type plus the rollback snapshots of open sessions.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    pub(crate) items: HashMap<Guid, T>,
    pub(crate) snapshots: HashMap<Guid, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            snapshots: HashMap::new(),
        }
    }
}

impl<T> Collection<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, guid: &Guid) -> Option<&T> {
        self.items.get(guid)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}

/// Typed access from a book to the collection holding `T`.
pub trait Stores<T: BusinessObject> {
    fn collection(&self) -> &Collection<T>;

    #[doc(hidden)]
    fn collection_mut(&mut self, token: Token) -> &mut Collection<T>;
}
