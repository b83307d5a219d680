/*!
 * Chapter persistence.
 *
 * The orchestrator only sees the `ChapterStore` trait: load a chapter's
 * source, save an accepted stage result, read one back.
 *
 * - `MemoryChapterStore`: in-process store for tests and embedding
 * - `SqliteChapterStore`: SQLite store with schema versioning and cascading deletes
 */

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::errors::StoreError;
use crate::orchestration::state::Stage;
use crate::segmentation::SourceText;

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{DatabaseConnection, DatabaseStats};
pub use models::{ChapterRecord, SegmentPair, StageReport, StageResult};
pub use repository::SqliteChapterStore;

/// Storage collaborator used by the orchestrator
#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Load a chapter's source text
    async fn load_source(&self, chapter_id: &str) -> Result<SourceText, StoreError>;

    /// Save the accepted result of a stage, replacing any earlier one
    async fn save_result(&self, chapter_id: &str, result: StageResult) -> Result<(), StoreError>;

    /// Load the accepted result of a stage, if any
    async fn load_result(&self, chapter_id: &str, stage: Stage) -> Result<Option<StageResult>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryChapter {
    source: Option<SourceText>,
    results: HashMap<Stage, StageResult>,
}

/// Chapter store kept in memory
#[derive(Debug, Default)]
pub struct MemoryChapterStore {
    chapters: RwLock<HashMap<String, MemoryChapter>>,
}

impl MemoryChapterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a chapter's source, dropping its results
    pub fn insert_source(&self, chapter_id: &str, text: &str, language: &str) {
        self.chapters.write().insert(
            chapter_id.to_string(),
            MemoryChapter {
                source: Some(SourceText::new(text, language)),
                results: HashMap::new(),
            },
        );
    }

    /// Remove a chapter with its results
    pub fn remove_chapter(&self, chapter_id: &str) -> bool {
        self.chapters.write().remove(chapter_id).is_some()
    }

    /// Number of stored stage results across all chapters
    pub fn result_count(&self) -> usize {
        self.chapters.read().values().map(|c| c.results.len()).sum()
    }
}

#[async_trait]
impl ChapterStore for MemoryChapterStore {
    async fn load_source(&self, chapter_id: &str) -> Result<SourceText, StoreError> {
        self.chapters
            .read()
            .get(chapter_id)
            .and_then(|chapter| chapter.source.clone())
            .ok_or_else(|| StoreError::NotFound(format!("chapter {}", chapter_id)))
    }

    async fn save_result(&self, chapter_id: &str, result: StageResult) -> Result<(), StoreError> {
        let mut chapters = self.chapters.write();
        let chapter = chapters
            .get_mut(chapter_id)
            .ok_or_else(|| StoreError::NotFound(format!("chapter {}", chapter_id)))?;
        chapter.results.insert(result.stage, result);
        Ok(())
    }

    async fn load_result(&self, chapter_id: &str, stage: Stage) -> Result<Option<StageResult>, StoreError> {
        Ok(self
            .chapters
            .read()
            .get(chapter_id)
            .and_then(|chapter| chapter.results.get(&stage).cloned()))
    }
}
