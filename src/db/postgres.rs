use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::manager::Pool;
use crate::db::schema::{answers, processed_events, synonyms};

use super::{
    DatabaseError,
    models::{AnswerEntry, NewProcessedEvent, ProcessedEvent, SynonymEntry},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = processed_events)]
struct DbProcessedEvent {
    id: i64,
    event_id: String,
    text: String,
    processed_at: DateTime<Utc>,
}

impl From<DbProcessedEvent> for ProcessedEvent {
    fn from(value: DbProcessedEvent) -> Self {
        Self {
            id: value.id,
            event_id: value.event_id,
            text: value.text,
            processed_at: value.processed_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = processed_events)]
struct NewDbProcessedEvent<'a> {
    event_id: &'a str,
    text: &'a str,
    processed_at: &'a DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = synonyms)]
struct DbSynonymEntry {
    id: i64,
    canonical_term: String,
    raw_term: String,
}

impl From<DbSynonymEntry> for SynonymEntry {
    fn from(value: DbSynonymEntry) -> Self {
        Self {
            id: value.id,
            canonical_term: value.canonical_term,
            raw_term: value.raw_term,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = answers)]
struct DbAnswerEntry {
    id: i64,
    canonical_term: String,
    answer_text: String,
}

impl From<DbAnswerEntry> for AnswerEntry {
    fn from(value: DbAnswerEntry) -> Self {
        Self {
            id: value.id,
            canonical_term: value.canonical_term,
            answer_text: value.answer_text,
        }
    }
}

async fn with_connection<T, F>(pool: Pool, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct PostgresEventStore {
    pool: Pool,
}

impl PostgresEventStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::EventStore for PostgresEventStore {
    async fn record_if_absent(&self, event: &NewProcessedEvent) -> Result<bool, DatabaseError> {
        let event = event.clone();
        with_connection(self.pool.clone(), move |conn| {
            let row = NewDbProcessedEvent {
                event_id: &event.event_id,
                text: &event.text,
                processed_at: &event.processed_at,
            };

            diesel::insert_into(processed_events::table)
                .values(&row)
                .on_conflict(processed_events::event_id)
                .do_nothing()
                .execute(conn)
                .map(|inserted| inserted == 1)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, DatabaseError> {
        let wanted = event_id.to_string();
        with_connection(self.pool.clone(), move |conn| {
            processed_events::table
                .filter(processed_events::event_id.eq(wanted))
                .select(DbProcessedEvent::as_select())
                .first::<DbProcessedEvent>(conn)
                .optional()
                .map(|row| row.map(ProcessedEvent::from))
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct PostgresSynonymStore {
    pool: Pool,
}

impl PostgresSynonymStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::SynonymStore for PostgresSynonymStore {
    async fn find_by_raw_term(
        &self,
        raw_term: &str,
    ) -> Result<Option<SynonymEntry>, DatabaseError> {
        let wanted = raw_term.to_string();
        with_connection(self.pool.clone(), move |conn| {
            synonyms::table
                .filter(synonyms::raw_term.eq(wanted))
                .order(synonyms::id.asc())
                .select(DbSynonymEntry::as_select())
                .first::<DbSynonymEntry>(conn)
                .optional()
                .map(|row| row.map(SynonymEntry::from))
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct PostgresAnswerStore {
    pool: Pool,
}

impl PostgresAnswerStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::AnswerStore for PostgresAnswerStore {
    async fn find_by_canonical_term(
        &self,
        canonical_term: &str,
    ) -> Result<Option<AnswerEntry>, DatabaseError> {
        let wanted = canonical_term.to_string();
        with_connection(self.pool.clone(), move |conn| {
            answers::table
                .filter(answers::canonical_term.eq(wanted))
                .order(answers::id.asc())
                .select(DbAnswerEntry::as_select())
                .first::<DbAnswerEntry>(conn)
                .optional()
                .map(|row| row.map(AnswerEntry::from))
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
