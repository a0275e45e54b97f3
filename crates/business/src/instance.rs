//! Edit-session state machine embedded in every business object.
//!
//! ```text
//!            begin_edit                 begin_edit / commit_edit (depth > 1)
//!   Clean ──────────────▶ Editing(1) ◀──────────────▶ Editing(n)
//!     ▲                      │   │
//!     └──── commit_edit ─────┘   └──── destroy ────▶ Destroyed
//! ```
//!
//! Only the `Editing(1) -> Clean` transition is reported as
//! [`EditTransition::Outermost`]; that is the point where the owning book
//! notifies its backend and the dirty flag is cleared. Setters mark the
//! instance dirty unconditionally, whether or not a session is open.
//!
//! Transitions are crate-private: outside this crate an instance can be
//! inspected but only the [`crate::Book`] moves it.
//!
//! ```compile_fail
//! use bizbook_business::{Book, BusinessObject, Job};
//!
//! let mut book = Book::new();
//! let job = book.create::<Job>();
//! let mut instance = book.job(job).unwrap().instance().clone();
//! instance.mark_clean();
//! ```

use serde::Serialize;

use bizbook_core::{BookId, ContractViolation, EditTransition, Guid};

/// Identity plus edit-session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    guid: Guid,
    book: BookId,
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    edit_level: u32,
}

impl Instance {
    /// A clean instance with no open session.
    pub(crate) fn new(guid: Guid, book: BookId) -> Self {
        Self {
            guid,
            book,
            dirty: false,
            edit_level: 0,
        }
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn book(&self) -> BookId {
        self.book
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn edit_level(&self) -> u32 {
        self.edit_level
    }

    pub fn is_editing(&self) -> bool {
        self.edit_level > 0
    }

    /// Open a (possibly nested) session. Returns `true` for the outermost one.
    pub(crate) fn begin_edit(&mut self) -> bool {
        self.edit_level += 1;
        self.edit_level == 1
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Close one session level.
    ///
    /// The dirty flag is left alone: the caller clears it once the backend
    /// accepted the outermost commit.
    pub(crate) fn commit_edit(&mut self) -> Result<EditTransition, ContractViolation> {
        if self.edit_level == 0 {
            return Err(ContractViolation::CommitWithoutBegin { guid: self.guid });
        }
        self.edit_level -= 1;
        if self.edit_level == 0 {
            Ok(EditTransition::Outermost)
        } else {
            Ok(EditTransition::Nested {
                depth: self.edit_level,
            })
        }
    }

    /// Abandon every open session level and forget pending changes.
    pub(crate) fn rollback_edit(&mut self) -> Result<(), ContractViolation> {
        if self.edit_level == 0 {
            return Err(ContractViolation::RollbackWithoutBegin { guid: self.guid });
        }
        self.edit_level = 0;
        self.dirty = false;
        Ok(())
    }

    /// Destruction is only legal from inside a session.
    pub(crate) fn ensure_destroyable(&self) -> Result<(), ContractViolation> {
        if self.edit_level == 0 {
            return Err(ContractViolation::DestroyOutsideSession { guid: self.guid });
        }
        Ok(())
    }
}
