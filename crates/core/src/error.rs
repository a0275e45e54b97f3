//! Domain error model.

use thiserror::Error;

use crate::backend::BackendError;
use crate::session::ContractViolation;

/// Result type used across the business layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Attribute setters never fail; errors come from identity lookups, owner
/// validation, reported contract violations and backend rejections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The identity is unknown to the book, or the object was destroyed.
    #[error("not found")]
    NotFound,

    /// The identity is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The object could not be turned into a commit snapshot.
    #[error("snapshot failed: {0}")]
    Snapshot(String),

    /// The caller broke the edit-session protocol (reported, not fatal).
    #[error("contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),

    /// The backend refused a commit.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
