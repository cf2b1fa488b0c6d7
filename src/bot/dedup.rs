use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::DedupFailurePolicy;
use crate::db::{DatabaseError, EventStore, NewProcessedEvent};

/// Admits each event id once, backed by an insert-if-absent on the store.
pub struct EventDeduplicator {
    store: Arc<dyn EventStore>,
    policy: DedupFailurePolicy,
}

impl EventDeduplicator {
    pub fn new(store: Arc<dyn EventStore>, policy: DedupFailurePolicy) -> Self {
        Self { store, policy }
    }

    /// `Ok(true)` when the caller should process the event.
    pub async fn admit(&self, event_id: &str, text: &str) -> Result<bool, DatabaseError> {
        match self
            .store
            .record_if_absent(&NewProcessedEvent::new(event_id, text))
            .await
        {
            Ok(true) => Ok(true),
            Ok(false) => {
                debug!("event already processed event_id={}", event_id);
                Ok(false)
            }
            Err(e) => match self.policy {
                DedupFailurePolicy::FailOpen => {
                    warn!(
                        "dedup store failed, admitting event anyway event_id={}: {}",
                        event_id, e
                    );
                    Ok(true)
                }
                DedupFailurePolicy::FailClosed => Err(e),
            },
        }
    }
}
