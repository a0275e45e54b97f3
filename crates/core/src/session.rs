//! Edit-session contract shared by every business object.
//!
//! The per-object state machine lives with the objects in
//! `bizbook-business`; this module holds what callers and backends see of
//! it: the commit outcome, the ways a caller can break the protocol, and the
//! policy a book applies when that happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DomainError;
use crate::id::Guid;

/// Outcome of a successful `commit_edit`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditTransition {
    /// An inner session closed; `depth` sessions remain open.
    Nested { depth: u32 },
    /// The outermost session closed.
    Outermost,
}

/// Caller errors against the edit-session protocol.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("commit_edit on {guid} without a matching begin_edit")]
    CommitWithoutBegin { guid: Guid },

    #[error("rollback_edit on {guid} without an open edit session")]
    RollbackWithoutBegin { guid: Guid },

    #[error("destroy on {guid} outside an edit session")]
    DestroyOutsideSession { guid: Guid },
}

/// How a book reacts to a [`ContractViolation`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractPolicy {
    /// Treat the violation as a fatal programming error.
    Panic,
    /// Log it and hand it back as `DomainError::ContractViolation`.
    Report,
}

impl Default for ContractPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ContractPolicy::Panic
        } else {
            ContractPolicy::Report
        }
    }
}

impl ContractPolicy {
    /// Apply the policy. Under `Panic` this does not return.
    pub fn enforce(self, violation: ContractViolation) -> DomainError {
        match self {
            ContractPolicy::Panic => panic!("edit-session contract violated: {violation}"),
            ContractPolicy::Report => {
                tracing::error!(%violation, "edit-session contract violated");
                DomainError::ContractViolation(violation)
            }
        }
    }
}
