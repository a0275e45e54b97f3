//! Backend implementations a book can be opened with.

pub mod in_memory;
pub mod publishing;

pub use in_memory::InMemoryBackend;
pub use publishing::PublishingBackend;
