//! Parties: objects that own a set of jobs.

use std::collections::HashSet;

use crate::ids::JobId;
use crate::object::{BusinessObject, Token};

/// Set of jobs linked to a party, keyed by job identity.
///
/// Only the book mutates it, as a side effect of owner-link changes and
/// destruction; outside this crate it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberIndex {
    jobs: HashSet<JobId>,
}

impl MemberIndex {
    pub fn contains(&self, job: JobId) -> bool {
        self.jobs.contains(&job)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Linked jobs in identity order.
    pub fn sorted(&self) -> Vec<JobId> {
        let mut jobs: Vec<JobId> = self.jobs.iter().copied().collect();
        jobs.sort();
        jobs
    }

    pub(crate) fn insert(&mut self, job: JobId) -> bool {
        self.jobs.insert(job)
    }

    pub(crate) fn remove(&mut self, job: JobId) -> bool {
        self.jobs.remove(&job)
    }
}

/// A business object that can own jobs (customers, vendors).
pub trait Party: BusinessObject {
    fn members(&self) -> &MemberIndex;

    #[doc(hidden)]
    fn members_mut(&mut self, token: Token) -> &mut MemberIndex;
}

/// Defines a party type: the object, its edit handle, and its `Entity`,
/// `BusinessObject` and `Party` impls.
///
/// Parties carry a number, a name, notes and an active flag; their job
/// membership index is not part of the commit snapshot.
macro_rules! party_object {
    (
        $(#[$meta:meta])*
        $name:ident, $handle:ident, $id:ident, $type_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize)]
        pub struct $name {
            instance: $crate::instance::Instance,
            number: String,
            name: String,
            notes: String,
            active: bool,
            #[serde(skip)]
            jobs: $crate::party::MemberIndex,
        }

        impl $name {
            /// User-facing number, not the `Guid`.
            pub fn number(&self) -> &str {
                &self.number
            }

            pub fn name(&self) -> &str {
                &self.name
            }

            pub fn notes(&self) -> &str {
                &self.notes
            }
        }

        #[doc = concat!("Edit handle on a ", stringify!($name), " held by a book.")]
        #[derive(Debug)]
        pub struct $handle<'a> {
            party: &'a mut $name,
        }

        impl<'a> $handle<'a> {
            pub(crate) fn new(party: &'a mut $name) -> Self {
                Self { party }
            }

            pub fn set_number(&mut self, number: impl Into<String>) {
                self.party.number = number.into();
                self.party.instance.mark_dirty();
            }

            pub fn set_name(&mut self, name: impl Into<String>) {
                self.party.name = name.into();
                self.party.instance.mark_dirty();
            }

            pub fn set_notes(&mut self, notes: impl Into<String>) {
                self.party.notes = notes.into();
                self.party.instance.mark_dirty();
            }

            pub fn set_active(&mut self, active: bool) {
                self.party.active = active;
                self.party.instance.mark_dirty();
            }
        }

        impl ::core::ops::Deref for $handle<'_> {
            type Target = $name;

            fn deref(&self) -> &$name {
                &*self.party
            }
        }

        impl ::bizbook_core::Entity for $name {
            type Id = $crate::ids::$id;

            fn guid(&self) -> ::bizbook_core::Guid {
                self.instance.guid()
            }

            fn book(&self) -> ::bizbook_core::BookId {
                self.instance.book()
            }
        }

        impl $crate::object::BusinessObject for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn instance(&self) -> &$crate::instance::Instance {
                &self.instance
            }

            fn is_active(&self) -> bool {
                self.active
            }

            fn printable(&self) -> String {
                self.name.clone()
            }

            fn linked_jobs(&self) -> Vec<$crate::ids::JobId> {
                self.jobs.sorted()
            }

            fn create(
                instance: $crate::instance::Instance,
                _: $crate::object::Token,
            ) -> Self {
                Self {
                    instance,
                    number: String::new(),
                    name: String::new(),
                    notes: String::new(),
                    active: true,
                    jobs: $crate::party::MemberIndex::default(),
                }
            }

            fn instance_mut(
                &mut self,
                _: $crate::object::Token,
            ) -> &mut $crate::instance::Instance {
                &mut self.instance
            }

            fn set_active(&mut self, active: bool, _: $crate::object::Token) {
                $handle::new(self).set_active(active);
            }

            fn restore_from(&mut self, snapshot: Self, _: $crate::object::Token) {
                let instance = self.instance.clone();
                let jobs = ::std::mem::take(&mut self.jobs);
                *self = snapshot;
                self.instance = instance;
                self.jobs = jobs;
            }
        }

        impl $crate::party::Party for $name {
            fn members(&self) -> &$crate::party::MemberIndex {
                &self.jobs
            }

            fn members_mut(&mut self, _: $crate::object::Token) -> &mut $crate::party::MemberIndex {
                &mut self.jobs
            }
        }
    };
}

pub(crate) use party_object;
