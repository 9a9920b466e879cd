//! Repository for the `transcriptions` table.
//!
//! Rows are created as placeholders when an upload lands and written once
//! more when the vendor job completes. Updates are keyed by row id only.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{Result, StoreError};
use crate::sqlite::row_types::{NewTranscription, RecordId, TranscriptionRow};

const COLUMNS: &str =
    "id, user_id, filename, filepath, transcript, duration_seconds, created_at, updated_at";

/// Stateless; every method takes `&Connection`.
pub struct TranscriptionRepo;

impl TranscriptionRepo {
    /// Insert a placeholder row with null transcript and duration.
    pub fn insert_placeholder(
        conn: &Connection,
        new: &NewTranscription,
    ) -> Result<TranscriptionRow> {
        let now = chrono::Utc::now().to_rfc3339();
        let row = conn.query_row(
            &format!(
                "INSERT INTO transcriptions
                     (user_id, filename, filepath, transcript, duration_seconds, created_at, updated_at)
                 VALUES (?1, ?2, ?3, NULL, NULL, ?4, ?4)
                 RETURNING {COLUMNS}"
            ),
            params![new.user_id, new.filename, new.filepath, now],
            Self::map_row,
        )?;
        Ok(row)
    }

    /// Write the transcript and duration onto exactly one row.
    pub fn update_result(
        conn: &Connection,
        id: RecordId,
        transcript: Option<&str>,
        duration_seconds: Option<f64>,
    ) -> Result<()> {
        let changed = conn.execute(
            "UPDATE transcriptions
             SET transcript = ?1, duration_seconds = ?2, updated_at = ?3
             WHERE id = ?4",
            params![transcript, duration_seconds, chrono::Utc::now().to_rfc3339(), id.0],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.0));
        }
        Ok(())
    }

    /// Get a row by id.
    pub fn get_by_id(conn: &Connection, id: RecordId) -> Result<Option<TranscriptionRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM transcriptions WHERE id = ?1"),
                params![id.0],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All rows sharing a generated file name, oldest first.
    #[cfg(test)]
    pub fn list_by_filename(conn: &Connection, filename: &str) -> Result<Vec<TranscriptionRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM transcriptions WHERE filename = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![filename], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Up to `limit` rows in insertion order.
    pub fn list(conn: &Connection, limit: u32) -> Result<Vec<TranscriptionRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM transcriptions ORDER BY id LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(params![limit], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Count all rows.
    #[cfg(test)]
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transcriptions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranscriptionRow> {
        Ok(TranscriptionRow {
            id: RecordId(row.get(0)?),
            user_id: row.get(1)?,
            filename: row.get(2)?,
            filepath: row.get(3)?,
            transcript: row.get(4)?,
            duration_seconds: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
