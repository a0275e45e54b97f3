use std::sync::Arc;

use bizbook_core::{Backend, BackendError, CommitRecord};
use bizbook_events::{Event, EventBus, LifecycleEvent};

/// Stores through an inner backend, then publishes the record as a
/// [`LifecycleEvent`].
///
/// The inner backend is the source of truth: a refused store fails the commit,
/// a failed publish is only logged.
pub struct PublishingBackend<B> {
    inner: Arc<dyn Backend>,
    bus: B,
}

impl<B> PublishingBackend<B> {
    pub fn new(inner: Arc<dyn Backend>, bus: B) -> Self {
        Self { inner, bus }
    }
}

impl<B> core::fmt::Debug for PublishingBackend<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PublishingBackend")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<B> Backend for PublishingBackend<B>
where
    B: EventBus<LifecycleEvent>,
{
    fn commit(&self, record: &CommitRecord) -> Result<(), BackendError> {
        self.inner.commit(record)?;

        let event = LifecycleEvent::from(record.clone());
        let event_type = event.event_type();
        if let Err(e) = self.bus.publish(event) {
            tracing::warn!(guid = %record.guid, event_type, error = %e, "lifecycle event not published");
        }
        Ok(())
    }
}
