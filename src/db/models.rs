use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable marker that an inbound event id has already been handled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessedEvent {
    pub id: i64,
    pub event_id: String,
    /// Snapshot of the message text at first sight.
    pub text: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProcessedEvent {
    pub event_id: String,
    pub text: String,
    pub processed_at: DateTime<Utc>,
}

impl NewProcessedEvent {
    pub fn new(event_id: &str, text: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            text: text.to_string(),
            processed_at: Utc::now(),
        }
    }
}

/// Maps a raw surface token to the canonical term used for answer lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynonymEntry {
    pub id: i64,
    pub canonical_term: String,
    pub raw_term: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntry {
    pub id: i64,
    pub canonical_term: String,
    pub answer_text: String,
}
