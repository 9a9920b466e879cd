//! Async facade over the `SQLite` repositories.
//!
//! Handlers hold an `Arc<dyn TranscriptionStore>`; the `SQLite`
//! implementation runs every query on the blocking pool.

use async_trait::async_trait;
use tokio::task;
use tracing::{debug, instrument};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::TranscriptionRepo;
use crate::sqlite::row_types::{NewTranscription, RecordId, TranscriptionRow};

/// Persistent record of uploads and their transcripts.
#[async_trait]
pub trait TranscriptionStore: Send + Sync {
    /// Create a row with null transcript and duration and return it.
    ///
    /// The returned row's `id` is the handle for [`update_result`](Self::update_result).
    async fn insert_placeholder(&self, new: NewTranscription) -> Result<TranscriptionRow>;

    /// Set transcript and duration on the row with `id`.
    async fn update_result(
        &self,
        id: RecordId,
        transcript: Option<String>,
        duration_seconds: Option<f64>,
    ) -> Result<()>;

    /// Fetch a single row.
    async fn get(&self, id: RecordId) -> Result<Option<TranscriptionRow>>;

    /// Up to `limit` rows, used by the connectivity probe.
    async fn sample(&self, limit: u32) -> Result<Vec<TranscriptionRow>>;
}

/// [`TranscriptionStore`] backed by an `r2d2` `SQLite` pool.
#[derive(Clone)]
pub struct SqliteTranscriptionStore {
    pool: ConnectionPool,
}

impl SqliteTranscriptionStore {
    /// Open a file-backed store and bring its schema up to date.
    pub fn open(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = connection::new_file(path, config)?;
        Self::migrated(pool)
    }

    /// In-memory store with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let pool = connection::new_in_memory(&ConnectionConfig::default())?;
        Self::migrated(pool)
    }

    fn migrated(pool: ConnectionPool) -> Result<Self> {
        let conn = pool.get()?;
        let applied = run_migrations(&conn)?;
        debug!(applied, "store schema ready");
        drop(conn);
        Ok(Self { pool })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("blocking store task failed: {e}")))?
    }
}

#[async_trait]
impl TranscriptionStore for SqliteTranscriptionStore {
    #[instrument(skip(self, new), fields(filename = %new.filename))]
    async fn insert_placeholder(&self, new: NewTranscription) -> Result<TranscriptionRow> {
        self.with_conn(move |conn| TranscriptionRepo::insert_placeholder(conn, &new))
            .await
    }

    #[instrument(skip(self, transcript))]
    async fn update_result(
        &self,
        id: RecordId,
        transcript: Option<String>,
        duration_seconds: Option<f64>,
    ) -> Result<()> {
        self.with_conn(move |conn| {
            TranscriptionRepo::update_result(conn, id, transcript.as_deref(), duration_seconds)
        })
        .await
    }

    async fn get(&self, id: RecordId) -> Result<Option<TranscriptionRow>> {
        self.with_conn(move |conn| TranscriptionRepo::get_by_id(conn, id))
            .await
    }

    async fn sample(&self, limit: u32) -> Result<Vec<TranscriptionRow>> {
        self.with_conn(move |conn| TranscriptionRepo::list(conn, limit))
            .await
    }
}
