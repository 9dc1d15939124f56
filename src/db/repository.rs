use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Provenance, SavedSummaryRecord, SummaryMode};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Append a record. Returns false, leaving the store untouched, when the
    /// id is already taken.
    pub async fn insert_summary(&self, record: SavedSummaryRecord) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT OR IGNORE INTO saved_summaries
                           (id, video_url, title, thumbnail_url, summary, provenance, mode, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                    params![
                        record.id,
                        record.video_url,
                        record.title,
                        record.thumbnail_url,
                        record.summary,
                        record.provenance.as_str(),
                        record.mode.as_str(),
                        record.created_at,
                    ],
                )?;
                Ok(changed == 1)
            })
            .await?;
        Ok(inserted)
    }

    /// Most recent first; records created in the same millisecond keep
    /// reverse insertion order.
    pub async fn list_summaries(&self) -> Result<Vec<SavedSummaryRecord>> {
        let records = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, video_url, title, thumbnail_url, summary, provenance, mode, created_at
                       FROM saved_summaries
                       ORDER BY created_at DESC, rowid DESC"#,
                )?;
                let records = stmt
                    .query_map([], record_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    /// Returns whether a record was removed.
    pub async fn delete_summary(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let removed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM saved_summaries WHERE id = ?1", params![id])?;
                Ok(changed > 0)
            })
            .await?;
        Ok(removed)
    }
}

fn record_from_row(row: &Row) -> rusqlite::Result<SavedSummaryRecord> {
    let provenance: String = row.get(5)?;
    let mode: String = row.get(6)?;
    Ok(SavedSummaryRecord {
        id: row.get(0)?,
        video_url: row.get(1)?,
        title: row.get(2)?,
        thumbnail_url: row.get(3)?,
        summary: row.get(4)?,
        provenance: Provenance::parse(&provenance).unwrap_or(Provenance::Metadata),
        mode: SummaryMode::from_label(Some(&mode)),
        created_at: row.get(7)?,
    })
}
