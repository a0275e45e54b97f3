//! `bizbook-core` — building blocks shared by every business object.
//!
//! Identity, the edit-session contract and the backend seam. No storage
//! and no business rules live here.

pub mod backend;
pub mod entity;
pub mod error;
pub mod id;
pub mod session;

pub use backend::{Backend, BackendError, CommitKind, CommitRecord};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BookId, Guid};
pub use session::{ContractPolicy, ContractViolation, EditTransition};
