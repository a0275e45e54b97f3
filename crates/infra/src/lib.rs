//! Infrastructure: backends, configuration and book wiring.

pub mod backend;
pub mod config;

use std::sync::Arc;

use bizbook_business::Book;
use bizbook_core::Backend;
use bizbook_events::{InMemoryEventBus, LifecycleEvent};

use crate::backend::{InMemoryBackend, PublishingBackend};
use crate::config::{BackendKind, BookConfig};

/// A freshly opened book together with handles on its backend.
#[derive(Debug)]
pub struct OpenedBook {
    pub book: Book,
    pub store: Arc<InMemoryBackend>,
    /// Present when the book publishes lifecycle events.
    pub events: Option<Arc<InMemoryEventBus<LifecycleEvent>>>,
}

/// Open an empty book wired according to `config`.
pub fn open_book(config: &BookConfig) -> OpenedBook {
    let store = Arc::new(InMemoryBackend::new());

    let mut events = None;
    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Memory => store.clone(),
        BackendKind::Events => {
            let bus: Arc<InMemoryEventBus<LifecycleEvent>> = Arc::new(InMemoryEventBus::new());
            events = Some(bus.clone());
            Arc::new(PublishingBackend::new(store.clone(), bus))
        }
    };

    let book = Book::new()
        .with_backend(backend)
        .with_policy(config.contract_policy);

    tracing::info!(
        book_id = %book.id(),
        backend = ?config.backend,
        policy = ?config.contract_policy,
        "book opened"
    );

    OpenedBook {
        book,
        store,
        events,
    }
}
