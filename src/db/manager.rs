use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{AnswerStore, DatabaseError, EventStore, SynonymStore};
use std::sync::Arc;

#[cfg(feature = "postgres")]
use crate::db::postgres::{PostgresAnswerStore, PostgresEventStore, PostgresSynonymStore};
#[cfg(feature = "postgres")]
use diesel::RunQueryDsl;
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{
    SqliteAnswerStore, SqliteEventStore, SqliteSynonymStore, establish_connection,
};

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    event_store: Arc<dyn EventStore>,
    synonym_store: Arc<dyn SynonymStore>,
    answer_store: Arc<dyn AnswerStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS processed_events (
        id BIGSERIAL PRIMARY KEY,
        event_id TEXT NOT NULL UNIQUE,
        text TEXT NOT NULL,
        processed_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS synonyms (
        id BIGSERIAL PRIMARY KEY,
        canonical_term TEXT NOT NULL,
        raw_term TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS answers (
        id BIGSERIAL PRIMARY KEY,
        canonical_term TEXT NOT NULL,
        answer_text TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_synonyms_raw_term ON synonyms(raw_term)",
    "CREATE INDEX IF NOT EXISTS idx_answers_canonical_term ON answers(canonical_term)",
];

const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS processed_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id TEXT NOT NULL UNIQUE,
        text TEXT NOT NULL,
        processed_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS synonyms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        canonical_term TEXT NOT NULL,
        raw_term TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS answers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        canonical_term TEXT NOT NULL,
        answer_text TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_synonyms_raw_term ON synonyms(raw_term)",
    "CREATE INDEX IF NOT EXISTS idx_answers_canonical_term ON answers(canonical_term)",
];

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string();
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager = ConnectionManager::<PgConnection>::new(connection_string);

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections.unwrap_or(10))
                    .min_idle(Some(min_connections.unwrap_or(1)));

                let pool = builder
                    .build(manager)
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                Ok(Self {
                    event_store: Arc::new(PostgresEventStore::new(pool.clone())),
                    synonym_store: Arc::new(PostgresSynonymStore::new(pool.clone())),
                    answer_store: Arc::new(PostgresAnswerStore::new(pool.clone())),
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path is not configured".to_string())
                })?;
                let path_arc = Arc::new(path.clone());

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    event_store: Arc::new(SqliteEventStore::new(path_arc.clone())),
                    synonym_store: Arc::new(SqliteSynonymStore::new(path_arc.clone())),
                    answer_store: Arc::new(SqliteAnswerStore::new(path_arc)),
                    sqlite_path: Some(path),
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.clone().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool is not initialized".to_string())
                })?;
                Self::migrate_postgres(pool).await
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.clone().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path is not initialized".to_string())
                })?;
                Self::migrate_sqlite(path).await
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "postgres")]
    async fn migrate_postgres(pool: Pool) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            for statement in POSTGRES_SCHEMA {
                diesel::sql_query(*statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: String) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&path)?;

            for statement in SQLITE_SCHEMA {
                diesel::RunQueryDsl::execute(diesel::sql_query(*statement), &mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        self.event_store.clone()
    }

    pub fn synonym_store(&self) -> Arc<dyn SynonymStore> {
        self.synonym_store.clone()
    }

    pub fn answer_store(&self) -> Arc<dyn AnswerStore> {
        self.answer_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use diesel::Connection;
    use diesel::RunQueryDsl;
    use diesel::sqlite::SqliteConnection;
    use tempfile::NamedTempFile;

    use super::{DatabaseManager, DbType};
    use crate::config::DatabaseConfig;
    use crate::db::NewProcessedEvent;

    fn sqlite_config(path: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            conn_string: None,
            filename: Some(path.to_string()),
            max_connections: Some(1),
            min_connections: Some(1),
        }
    }

    fn seed(path: &str, statements: &[&str]) {
        let mut conn = SqliteConnection::establish(path).expect("open sqlite");
        for statement in statements {
            diesel::sql_query(*statement)
                .execute(&mut conn)
                .expect("seed statement");
        }
    }

    async fn migrated_manager(file: &NamedTempFile) -> (DatabaseManager, String) {
        let db_path = file.path().to_string_lossy().to_string();
        let manager = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");
        (manager, db_path)
    }

    #[tokio::test]
    async fn sqlite_event_record_is_inserted_once() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let (manager, _) = migrated_manager(&file).await;
        assert_eq!(manager.db_type(), DbType::Sqlite);

        let store = manager.event_store();
        let first = NewProcessedEvent::new("Ev001", "<@UBOT> 予算について教えて");
        assert!(store.record_if_absent(&first).await.expect("first insert"));

        let again = NewProcessedEvent::new("Ev001", "edited text");
        assert!(!store.record_if_absent(&again).await.expect("second insert"));

        let stored = store
            .find_by_event_id("Ev001")
            .await
            .expect("query")
            .expect("record exists");
        assert_eq!(stored.text, "<@UBOT> 予算について教えて");
        assert!(store.find_by_event_id("Ev404").await.expect("query").is_none());
    }

    #[tokio::test]
    async fn sqlite_event_records_survive_reopen() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let (manager, db_path) = migrated_manager(&file).await;
        manager
            .event_store()
            .record_if_absent(&NewProcessedEvent::new("Ev002", "hello"))
            .await
            .expect("insert");

        let reopened = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("reopen");
        reopened.migrate().await.expect("migrate twice");
        let inserted = reopened
            .event_store()
            .record_if_absent(&NewProcessedEvent::new("Ev002", "hello"))
            .await
            .expect("insert after reopen");
        assert!(!inserted);
    }

    #[tokio::test]
    async fn sqlite_lookups_take_lowest_id_on_duplicates() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let (manager, db_path) = migrated_manager(&file).await;
        seed(
            &db_path,
            &[
                "INSERT INTO synonyms (canonical_term, raw_term) VALUES ('budget', '予算')",
                "INSERT INTO synonyms (canonical_term, raw_term) VALUES ('finance', '予算')",
                "INSERT INTO answers (canonical_term, answer_text) VALUES ('budget', 'costs are tracked quarterly')",
                "INSERT INTO answers (canonical_term, answer_text) VALUES ('budget', 'stale copy')",
            ],
        );

        let synonym = manager
            .synonym_store()
            .find_by_raw_term("予算")
            .await
            .expect("synonym query")
            .expect("synonym exists");
        assert_eq!(synonym.canonical_term, "budget");

        let answer = manager
            .answer_store()
            .find_by_canonical_term("budget")
            .await
            .expect("answer query")
            .expect("answer exists");
        assert_eq!(answer.answer_text, "costs are tracked quarterly");

        assert!(
            manager
                .synonym_store()
                .find_by_raw_term("経費")
                .await
                .expect("synonym query")
                .is_none()
        );
        assert!(
            manager
                .answer_store()
                .find_by_canonical_term("travel")
                .await
                .expect("answer query")
                .is_none()
        );
    }

    #[tokio::test]
    async fn sqlite_concurrent_deliveries_wait_for_the_lock() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let (manager, _) = migrated_manager(&file).await;
        let store = manager.event_store();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_if_absent(&NewProcessedEvent::new(&format!("EvC{i}"), "予算"))
                    .await
            }));
        }
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_if_absent(&NewProcessedEvent::new("EvShared", "予算"))
                    .await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.expect("task").expect("insert must not fail") {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 33);
    }
}
