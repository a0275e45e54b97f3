//! Backend seam: where a book reports committed and destroyed objects.
//!
//! A book calls [`Backend::commit`] exactly once per outermost `commit_edit`
//! and once per `destroy`. The backend decides what "persisting" means
//! (recording in memory, publishing on a bus, writing to storage, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::id::{BookId, Guid};
use std::sync::Arc;

/// What happened to the object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
    Updated,
    Destroyed,
}

/// Notification handed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub book_id: BookId,
    /// Stable type name of the object (e.g. "gncJob").
    pub entity_type: String,
    pub guid: Guid,
    pub kind: CommitKind,
    /// Serialized authoritative state at commit time.
    pub snapshot: JsonValue,
    pub committed_at: DateTime<Utc>,
}

impl CommitRecord {
    pub fn new(
        book_id: BookId,
        entity_type: impl Into<String>,
        guid: Guid,
        kind: CommitKind,
        snapshot: JsonValue,
    ) -> Self {
        Self {
            book_id,
            entity_type: entity_type.into(),
            guid,
            kind,
            snapshot,
            committed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend looked at the record and refused it.
    #[error("commit rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached (lock poisoned, bus closed, ...).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Storage/notification sink attached to a book.
pub trait Backend: Send + Sync + core::fmt::Debug {
    fn commit(&self, record: &CommitRecord) -> Result<(), BackendError>;
}

impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    fn commit(&self, record: &CommitRecord) -> Result<(), BackendError> {
        (**self).commit(record)
    }
}
