use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::{answers, processed_events, synonyms};

use super::{
    DatabaseError,
    models::{AnswerEntry, NewProcessedEvent, ProcessedEvent, SynonymEntry},
};

// Helper function to convert DateTime to ISO string for SQLite
fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// Helper function to parse ISO string to DateTime
fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}

// SQLite uses i32 for INTEGER (primary keys), but we want to keep i64 in our API
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = processed_events)]
struct DbProcessedEvent {
    id: i32,
    event_id: String,
    text: String,
    processed_at: String,
}

impl DbProcessedEvent {
    fn to_processed_event(&self) -> Result<ProcessedEvent, DatabaseError> {
        Ok(ProcessedEvent {
            id: self.id as i64,
            event_id: self.event_id.clone(),
            text: self.text.clone(),
            processed_at: string_to_datetime(&self.processed_at)?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = processed_events)]
struct NewDbProcessedEvent<'a> {
    event_id: &'a str,
    text: &'a str,
    processed_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = synonyms)]
struct DbSynonymEntry {
    id: i32,
    canonical_term: String,
    raw_term: String,
}

impl From<DbSynonymEntry> for SynonymEntry {
    fn from(value: DbSynonymEntry) -> Self {
        Self {
            id: value.id as i64,
            canonical_term: value.canonical_term,
            raw_term: value.raw_term,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = answers)]
struct DbAnswerEntry {
    id: i32,
    canonical_term: String,
    answer_text: String,
}

impl From<DbAnswerEntry> for AnswerEntry {
    fn from(value: DbAnswerEntry) -> Self {
        Self {
            id: value.id as i64,
            canonical_term: value.canonical_term,
            answer_text: value.answer_text,
        }
    }
}

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Opens a connection that waits for concurrent writers instead of failing
/// with "database is locked". WAL keeps lookups from blocking on inserts.
pub(crate) fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    let mut conn = SqliteConnection::establish(path)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    conn.batch_execute(&format!(
        "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}; PRAGMA journal_mode = WAL;"
    ))
    .map_err(|e| DatabaseError::Connection(format!("failed to configure sqlite: {e}")))?;
    Ok(conn)
}

async fn with_connection<T, F>(db_path: Arc<String>, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = establish_connection(&db_path)?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct SqliteEventStore {
    db_path: Arc<String>,
}

impl SqliteEventStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::EventStore for SqliteEventStore {
    async fn record_if_absent(&self, event: &NewProcessedEvent) -> Result<bool, DatabaseError> {
        let event = event.clone();
        with_connection(self.db_path.clone(), move |conn| {
            let row = NewDbProcessedEvent {
                event_id: &event.event_id,
                text: &event.text,
                processed_at: datetime_to_string(&event.processed_at),
            };

            diesel::insert_or_ignore_into(processed_events::table)
                .values(&row)
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
        with_connection(self.db_path.clone(), move |conn| {
            processed_events::table
                .filter(processed_events::event_id.eq(wanted))
                .select(DbProcessedEvent::as_select())
                .first::<DbProcessedEvent>(conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|e| e.to_processed_event())
                .transpose()
        })
        .await
    }
}

pub struct SqliteSynonymStore {
    db_path: Arc<String>,
}

impl SqliteSynonymStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::SynonymStore for SqliteSynonymStore {
    async fn find_by_raw_term(
        &self,
        raw_term: &str,
    ) -> Result<Option<SynonymEntry>, DatabaseError> {
        let wanted = raw_term.to_string();
        with_connection(self.db_path.clone(), move |conn| {
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

pub struct SqliteAnswerStore {
    db_path: Arc<String>,
}

impl SqliteAnswerStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::AnswerStore for SqliteAnswerStore {
    async fn find_by_canonical_term(
        &self,
        canonical_term: &str,
    ) -> Result<Option<AnswerEntry>, DatabaseError> {
        let wanted = canonical_term.to_string();
        with_connection(self.db_path.clone(), move |conn| {
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
