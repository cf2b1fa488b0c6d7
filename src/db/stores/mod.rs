use async_trait::async_trait;

use super::DatabaseError;
use super::models::{AnswerEntry, NewProcessedEvent, ProcessedEvent, SynonymEntry};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts the record unless one with the same event id exists.
    /// Returns `true` only when this call created the row.
    async fn record_if_absent(&self, event: &NewProcessedEvent) -> Result<bool, DatabaseError>;
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, DatabaseError>;
}

#[async_trait]
pub trait SynonymStore: Send + Sync {
    async fn find_by_raw_term(&self, raw_term: &str)
    -> Result<Option<SynonymEntry>, DatabaseError>;
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
    async fn find_by_canonical_term(
        &self,
        canonical_term: &str,
    ) -> Result<Option<AnswerEntry>, DatabaseError>;
}
