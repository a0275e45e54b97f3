use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use bizbook_core::{Backend, BackendError, BookId, CommitKind, CommitRecord, Guid};

#[derive(Debug, Default)]
struct State {
    book_id: Option<BookId>,
    objects: HashMap<Guid, JsonValue>,
    log: Vec<CommitRecord>,
    read_only: bool,
}

/// In-memory backend: latest committed snapshot per object plus the full
/// commit log.
///
/// Bound to the first book that commits to it; records from any other book
/// are rejected. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every commit while set.
    pub fn set_read_only(&self, read_only: bool) {
        if let Ok(mut state) = self.state.write() {
            state.read_only = read_only;
        }
    }

    /// Last committed snapshot of a live object.
    pub fn snapshot(&self, guid: Guid) -> Option<JsonValue> {
        let state = self.state.read().ok()?;
        state.objects.get(&guid).cloned()
    }

    /// Number of objects currently stored (destroyed ones excluded).
    pub fn stored_count(&self) -> usize {
        self.state.read().map(|s| s.objects.len()).unwrap_or(0)
    }

    /// Every accepted record, in commit order.
    pub fn log(&self) -> Vec<CommitRecord> {
        self.state.read().map(|s| s.log.clone()).unwrap_or_default()
    }
}

impl Backend for InMemoryBackend {
    fn commit(&self, record: &CommitRecord) -> Result<(), BackendError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;

        if state.read_only {
            return Err(BackendError::Rejected("backend is read-only".to_string()));
        }

        let bound_book = state.book_id;
        match bound_book {
            Some(bound) if bound != record.book_id => {
                return Err(BackendError::Rejected(format!(
                    "backend belongs to book {bound}, record is from book {}",
                    record.book_id
                )));
            }
            Some(_) => {}
            None => state.book_id = Some(record.book_id),
        }

        match record.kind {
            CommitKind::Updated => {
                state.objects.insert(record.guid, record.snapshot.clone());
            }
            CommitKind::Destroyed => {
                state.objects.remove(&record.guid);
            }
        }
        state.log.push(record.clone());

        tracing::trace!(guid = %record.guid, kind = ?record.kind, "record stored");
        Ok(())
    }
}
