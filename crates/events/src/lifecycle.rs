use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizbook_core::{CommitKind, CommitRecord, Guid};

use crate::event::Event;

/// A book object reached durable state (committed) or went away (destroyed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Committed(CommitRecord),
    Destroyed(CommitRecord),
}

impl LifecycleEvent {
    pub fn record(&self) -> &CommitRecord {
        match self {
            LifecycleEvent::Committed(r) | LifecycleEvent::Destroyed(r) => r,
        }
    }

    pub fn guid(&self) -> Guid {
        self.record().guid
    }
}

impl From<CommitRecord> for LifecycleEvent {
    fn from(record: CommitRecord) -> Self {
        match record.kind {
            CommitKind::Updated => LifecycleEvent::Committed(record),
            CommitKind::Destroyed => LifecycleEvent::Destroyed(record),
        }
    }
}

impl Event for LifecycleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::Committed(_) => "bizbook.entity.committed",
            LifecycleEvent::Destroyed(_) => "bizbook.entity.destroyed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.record().committed_at
    }
}
