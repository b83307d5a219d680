/*!
 * SQLite-backed chapter store.
 *
 * Chapters hold the source text and its SHA-256 hash. Accepted stage results
 * reference their chapter and are removed with it through `ON DELETE CASCADE`.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rusqlite::{OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::errors::StoreError;
use crate::orchestration::state::Stage;
use crate::segmentation::SourceText;

use super::ChapterStore;
use super::connection::DatabaseConnection;
use super::models::{ChapterRecord, SegmentPair, StageReport, StageResult};

/// Chapter store persisted in SQLite
#[derive(Debug, Clone)]
pub struct SqliteChapterStore {
    /// Database connection
    db: DatabaseConnection,
}

impl SqliteChapterStore {
    /// Create a store on an open connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open (or create) a store at a path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Create a store with the default database location
    pub fn new_default() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    /// Create a store with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// The underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Insert or replace a chapter's source.
    ///
    /// Replacing a chapter whose text changed drops its stage results.
    pub async fn insert_chapter(&self, chapter_id: &str, source_text: &str, source_language: &str) -> Result<ChapterRecord> {
        let record = ChapterRecord::new(
            chapter_id.to_string(),
            source_text.to_string(),
            source_language.to_string(),
            Self::hash_text(source_text),
        );
        let row = record.clone();

        self.db
            .transaction_async(move |tx| {
                let previous_hash: Option<String> = tx
                    .query_row("SELECT source_hash FROM chapters WHERE id = ?1", [&row.id], |r| r.get(0))
                    .optional()?;

                if previous_hash.as_deref().is_some_and(|hash| hash != row.source_hash) {
                    debug!("Source of {} changed; dropping its stage results", row.id);
                    tx.execute("DELETE FROM stage_results WHERE chapter_id = ?1", [&row.id])?;
                }

                tx.execute(
                    r#"
                    INSERT INTO chapters (id, source_text, source_language, source_hash, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(id) DO UPDATE SET
                        source_text = excluded.source_text,
                        source_language = excluded.source_language,
                        source_hash = excluded.source_hash,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        row.id,
                        row.source_text,
                        row.source_language,
                        row.source_hash,
                        row.created_at,
                        row.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .with_context(|| format!("Failed to store chapter {}", chapter_id))?;

        Ok(record)
    }

    /// Get a chapter by ID
    pub async fn get_chapter(&self, chapter_id: &str) -> Result<Option<ChapterRecord>> {
        let chapter_id = chapter_id.to_string();

        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        r#"
                        SELECT id, source_text, source_language, source_hash, created_at, updated_at
                        FROM chapters WHERE id = ?1
                        "#,
                        [&chapter_id],
                        |row| {
                            Ok(ChapterRecord {
                                id: row.get(0)?,
                                source_text: row.get(1)?,
                                source_language: row.get(2)?,
                                source_hash: row.get(3)?,
                                created_at: row.get(4)?,
                                updated_at: row.get(5)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// List chapter IDs in insertion order
    pub async fn list_chapters(&self) -> Result<Vec<String>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare("SELECT id FROM chapters ORDER BY created_at, id")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(ids)
            })
            .await
    }

    /// Delete a chapter and, by cascade, its stage results.
    ///
    /// Returns whether the chapter existed.
    pub async fn delete_chapter(&self, chapter_id: &str) -> Result<bool> {
        let chapter_id = chapter_id.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM chapters WHERE id = ?1", [&chapter_id])?;
                Ok(deleted > 0)
            })
            .await
    }
}

#[async_trait]
impl ChapterStore for SqliteChapterStore {
    async fn load_source(&self, chapter_id: &str) -> Result<SourceText, StoreError> {
        let record = self
            .get_chapter(chapter_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("chapter {}", chapter_id)))?;

        Ok(SourceText::new(record.source_text, &record.source_language))
    }

    async fn save_result(&self, chapter_id: &str, result: StageResult) -> Result<(), StoreError> {
        let chapter_id = chapter_id.to_string();
        let report_json = serde_json::to_string(&result.report)?;
        let segments_json = serde_json::to_string(&result.segments)?;

        let saved = self
            .db
            .execute_async(move |conn| {
                let changed = conn.execute(
                    r#"
                    INSERT INTO stage_results (chapter_id, stage, result_text, report_json, segments_json, attempt, created_at)
                    SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
                    WHERE EXISTS (SELECT 1 FROM chapters WHERE id = ?1)
                    ON CONFLICT(chapter_id, stage) DO UPDATE SET
                        result_text = excluded.result_text,
                        report_json = excluded.report_json,
                        segments_json = excluded.segments_json,
                        attempt = excluded.attempt,
                        created_at = excluded.created_at
                    "#,
                    params![
                        chapter_id,
                        result.stage.to_string(),
                        result.text,
                        report_json,
                        segments_json,
                        result.attempt,
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;

        if saved {
            Ok(())
        } else {
            Err(StoreError::NotFound("chapter for stage result".to_string()))
        }
    }

    async fn load_result(&self, chapter_id: &str, stage: Stage) -> Result<Option<StageResult>, StoreError> {
        let chapter_id = chapter_id.to_string();

        let row = self
            .db
            .execute_async(move |conn| {
                let row = conn
                    .query_row(
                        r#"
                        SELECT result_text, report_json, segments_json, attempt
                        FROM stage_results WHERE chapter_id = ?1 AND stage = ?2
                        "#,
                        params![chapter_id, stage.to_string()],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, u32>(3)?,
                            ))
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        let Some((text, report_json, segments_json, attempt)) = row else {
            return Ok(None);
        };

        let report: StageReport = serde_json::from_str(&report_json)?;
        let segments: Vec<SegmentPair> = serde_json::from_str(&segments_json)?;

        Ok(Some(StageResult {
            stage,
            text,
            report,
            segments,
            attempt,
        }))
    }
}
