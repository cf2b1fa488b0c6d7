//! In-memory stores used by the pipeline tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::models::{AnswerEntry, NewProcessedEvent, ProcessedEvent, SynonymEntry};
use super::{AnswerStore, DatabaseError, EventStore, SynonymStore};

#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<HashMap<String, ProcessedEvent>>,
    failing: bool,
}

impl MemoryEventStore {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn record_if_absent(&self, event: &NewProcessedEvent) -> Result<bool, DatabaseError> {
        if self.failing {
            return Err(DatabaseError::Connection("store unavailable".to_string()));
        }
        let mut events = self.events.lock();
        if events.contains_key(&event.event_id) {
            return Ok(false);
        }
        let id = events.len() as i64 + 1;
        events.insert(
            event.event_id.clone(),
            ProcessedEvent {
                id,
                event_id: event.event_id.clone(),
                text: event.text.clone(),
                processed_at: event.processed_at,
            },
        );
        Ok(true)
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, DatabaseError> {
        if self.failing {
            return Err(DatabaseError::Connection("store unavailable".to_string()));
        }
        Ok(self.events.lock().get(event_id).cloned())
    }
}

#[derive(Default)]
pub struct MemorySynonymStore {
    entries: Vec<SynonymEntry>,
    failing: bool,
}

impl MemorySynonymStore {
    pub fn with_entries(pairs: &[(&str, &str)]) -> Self {
        let entries = pairs
            .iter()
            .enumerate()
            .map(|(i, (raw, canonical))| SynonymEntry {
                id: i as i64 + 1,
                canonical_term: canonical.to_string(),
                raw_term: raw.to_string(),
            })
            .collect();
        Self {
            entries,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: Vec::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl SynonymStore for MemorySynonymStore {
    async fn find_by_raw_term(
        &self,
        raw_term: &str,
    ) -> Result<Option<SynonymEntry>, DatabaseError> {
        if self.failing {
            return Err(DatabaseError::Query("synonyms unavailable".to_string()));
        }
        Ok(self.entries.iter().find(|e| e.raw_term == raw_term).cloned())
    }
}

#[derive(Default)]
pub struct MemoryAnswerStore {
    entries: Vec<AnswerEntry>,
    failing: bool,
}

impl MemoryAnswerStore {
    pub fn with_entries(pairs: &[(&str, &str)]) -> Self {
        let entries = pairs
            .iter()
            .enumerate()
            .map(|(i, (canonical, answer))| AnswerEntry {
                id: i as i64 + 1,
                canonical_term: canonical.to_string(),
                answer_text: answer.to_string(),
            })
            .collect();
        Self {
            entries,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: Vec::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl AnswerStore for MemoryAnswerStore {
    async fn find_by_canonical_term(
        &self,
        canonical_term: &str,
    ) -> Result<Option<AnswerEntry>, DatabaseError> {
        if self.failing {
            return Err(DatabaseError::Query("answers unavailable".to_string()));
        }
        Ok(self
            .entries
            .iter()
            .find(|e| e.canonical_term == canonical_term)
            .cloned())
    }
}
