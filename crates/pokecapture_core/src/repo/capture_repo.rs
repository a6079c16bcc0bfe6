//! Capture store contract with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Answer existence queries for (user, entity) pairs, singly or batched.
//! - Insert one record per capture and delete all matches per release.
//!
//! # Invariants
//! - Matching is exact and case-sensitive on both keys.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::capture::{CaptureRecord, CaptureRecordId, UserId};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

/// Names bound per `IN (...)` statement; stays below SQLite's variable cap.
const NAME_BATCH_SIZE: usize = 500;

pub type StoreResult<T> = Result<T, StoreError>;

/// Capture store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("capture store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid persisted capture record: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Document collection of capture records.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Returns every record matching both keys.
    async fn find_matching(
        &self,
        user_id: &UserId,
        entity_name: &str,
    ) -> StoreResult<Vec<CaptureRecord>>;

    /// Returns the subset of `entity_names` captured by `user_id`.
    async fn find_captured_names(
        &self,
        user_id: &UserId,
        entity_names: &[String],
    ) -> StoreResult<HashSet<String>>;

    /// Inserts one record and returns its document ID.
    async fn insert(&self, record: &CaptureRecord) -> StoreResult<CaptureRecordId>;

    /// Deletes every record matching both keys; returns the number removed.
    async fn delete_matching(&self, user_id: &UserId, entity_name: &str) -> StoreResult<usize>;
}

/// SQLite-backed capture collection.
///
/// Statements run on the blocking pool so a busy database file never stalls
/// the async executor.
pub struct SqliteCaptureStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCaptureStore {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs one statement batch against the connection off the async workers.
    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("blocking task failed: {err}")))?
    }
}

#[async_trait]
impl CaptureStore for SqliteCaptureStore {
    async fn find_matching(
        &self,
        user_id: &UserId,
        entity_name: &str,
    ) -> StoreResult<Vec<CaptureRecord>> {
        let user_id = user_id.as_str().to_string();
        let entity_name = entity_name.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, entity_name, user_id
                 FROM capture_records
                 WHERE user_id = ?1 AND entity_name = ?2
                 ORDER BY created_at ASC, id ASC;",
            )?;
            let mut rows = stmt.query(params![user_id, entity_name])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_record_row(row)?);
            }
            Ok(records)
        })
        .await
    }

    async fn find_captured_names(
        &self,
        user_id: &UserId,
        entity_names: &[String],
    ) -> StoreResult<HashSet<String>> {
        if entity_names.is_empty() {
            return Ok(HashSet::new());
        }

        let user_id = user_id.as_str().to_string();
        let entity_names = entity_names.to_vec();
        self.with_conn(move |conn| {
            let mut captured = HashSet::new();
            for chunk in entity_names.chunks(NAME_BATCH_SIZE) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!(
                    "SELECT DISTINCT entity_name
                     FROM capture_records
                     WHERE user_id = ? AND entity_name IN ({placeholders});"
                );
                let mut bind_values = Vec::with_capacity(chunk.len() + 1);
                bind_values.push(Value::Text(user_id.clone()));
                bind_values.extend(chunk.iter().map(|name| Value::Text(name.clone())));

                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query(params_from_iter(bind_values))?;
                while let Some(row) = rows.next()? {
                    captured.insert(row.get::<_, String>(0)?);
                }
            }
            Ok(captured)
        })
        .await
    }

    async fn insert(&self, record: &CaptureRecord) -> StoreResult<CaptureRecordId> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO capture_records (id, entity_name, user_id) VALUES (?1, ?2, ?3);",
                params![
                    record.id.to_string(),
                    record.entity_name.as_str(),
                    record.user_id.as_str()
                ],
            )?;
            Ok(record.id)
        })
        .await
    }

    async fn delete_matching(&self, user_id: &UserId, entity_name: &str) -> StoreResult<usize> {
        let user_id = user_id.as_str().to_string();
        let entity_name = entity_name.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM capture_records WHERE user_id = ?1 AND entity_name = ?2;",
                params![user_id, entity_name],
            )?;
            Ok(removed)
        })
        .await
    }
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<CaptureRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid id `{id_text}` in capture_records.id"))
    })?;
    let user_text: String = row.get("user_id")?;
    let user_id = UserId::new(user_text).map_err(|err| {
        StoreError::InvalidData(format!("{err} in capture_records.user_id"))
    })?;

    Ok(CaptureRecord {
        id,
        entity_name: row.get("entity_name")?,
        user_id,
    })
}

/// Process-local capture collection. Contents vanish with the process.
#[derive(Default)]
pub struct InMemoryCaptureStore {
    records: Mutex<Vec<CaptureRecord>>,
}

impl InMemoryCaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store with existing records, duplicates included.
    pub fn with_records(records: impl IntoIterator<Item = CaptureRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
        }
    }

    /// Total number of stored records across all users.
    pub fn len(&self) -> usize {
        self.records.lock().map_or(0, |records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<CaptureRecord>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))
    }
}

#[async_trait]
impl CaptureStore for InMemoryCaptureStore {
    async fn find_matching(
        &self,
        user_id: &UserId,
        entity_name: &str,
    ) -> StoreResult<Vec<CaptureRecord>> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .filter(|record| record.matches(user_id, entity_name))
            .cloned()
            .collect())
    }

    async fn find_captured_names(
        &self,
        user_id: &UserId,
        entity_names: &[String],
    ) -> StoreResult<HashSet<String>> {
        let wanted = entity_names.iter().collect::<HashSet<_>>();
        let records = self.lock()?;
        Ok(records
            .iter()
            .filter(|record| record.user_id == *user_id && wanted.contains(&record.entity_name))
            .map(|record| record.entity_name.clone())
            .collect())
    }

    async fn insert(&self, record: &CaptureRecord) -> StoreResult<CaptureRecordId> {
        self.lock()?.push(record.clone());
        Ok(record.id)
    }

    async fn delete_matching(&self, user_id: &UserId, entity_name: &str) -> StoreResult<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|record| !record.matches(user_id, entity_name));
        Ok(before - records.len())
    }
}
