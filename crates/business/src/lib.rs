//! Business objects (jobs, customers, vendors) and the book that owns them.
//!
//! Every object follows the same edit-session protocol: mutations are
//! bracketed by `begin_edit`/`commit_edit` on the [`Book`], setters mark the
//! object dirty, and the outermost commit notifies the book's backend.
//! Objects are only reachable through their book: shared references for
//! reads, `JobMut`/`CustomerMut`/`VendorMut` handles for attribute writes.

pub mod book;
pub mod customer;
pub mod ids;
pub mod instance;
pub mod job;
pub mod object;
pub mod owner;
pub mod party;
pub mod vendor;

pub use book::{Book, create};
pub use customer::{Customer, CustomerMut};
pub use ids::{CustomerId, JobId, VendorId};
pub use instance::Instance;
pub use job::{Job, JobMut};
pub use object::{BusinessObject, Collection, Stores};
pub use owner::{Owner, OwnerKind};
pub use party::{MemberIndex, Party};
pub use vendor::{Vendor, VendorMut};
