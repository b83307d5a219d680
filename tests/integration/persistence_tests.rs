/*!
 * Tests of chapter processing over the SQLite store
 */

use anyhow::Result;
use std::sync::Arc;

use chapterguard::errors::StoreError;
use chapterguard::orchestration::{CancellationFlag, Stage, StageRun};
use chapterguard::persistence::{ChapterStore, SqliteChapterStore};
use chapterguard::providers::mock::MockProvider;

use crate::common::mock_providers::shouting_provider;
use crate::common::{create_temp_dir, init_test_logging, orchestrator, prose_chapter, test_config};

#[tokio::test]
async fn test_processChapter_withSqliteStore_shouldPersistAcrossReopen() -> Result<()> {
    init_test_logging();
    let temp_dir = create_temp_dir()?;
    let db_path = temp_dir.path().join("chapters.db");
    let chapter = prose_chapter(4, 3);

    {
        let store = Arc::new(SqliteChapterStore::open(&db_path)?);
        store.insert_chapter("ch-1", &chapter, "en").await?;
        let orchestrator = orchestrator(&test_config(400), Arc::new(shouting_provider()), store.clone());

        let runs = orchestrator.process_chapter("ch-1", &CancellationFlag::new()).await?;
        assert!(runs.iter().all(StageRun::is_accepted));

        let stats = store.connection().stats()?;
        assert_eq!(stats.chapter_count, 1);
        assert_eq!(stats.result_count, 2);
    }

    let reopened = SqliteChapterStore::open(&db_path)?;
    let translation = reopened.load_result("ch-1", Stage::Translate).await?.unwrap();
    assert_eq!(translation.text, chapter.to_uppercase());
    assert!(translation.validation_report().is_some_and(|r| r.valid));

    let alignment = reopened.load_result("ch-1", Stage::Align).await?.unwrap();
    assert!(alignment.alignment_report().is_some_and(|r| !r.needs_review));
    assert_eq!(alignment.segments.len(), alignment.alignment_report().map_or(0, |r| r.pairs.len()));
    Ok(())
}

#[tokio::test]
async fn test_deleteChapter_afterProcessing_shouldRemoveResults() -> Result<()> {
    let store = Arc::new(SqliteChapterStore::new_in_memory()?);
    store.insert_chapter("ch-1", &prose_chapter(2, 2), "en").await?;
    store.insert_chapter("ch-2", &prose_chapter(2, 2), "en").await?;
    let orchestrator = orchestrator(&test_config(4000), Arc::new(MockProvider::working()), store.clone());
    let cancel = CancellationFlag::new();

    orchestrator.process_chapter("ch-1", &cancel).await?;
    orchestrator.process_chapter("ch-2", &cancel).await?;
    assert_eq!(store.connection().stats()?.result_count, 4);

    assert!(store.delete_chapter("ch-1").await?);
    assert!(!store.delete_chapter("ch-1").await?);

    assert_eq!(store.list_chapters().await?, vec!["ch-2".to_string()]);
    assert_eq!(store.connection().stats()?.result_count, 2);
    assert!(matches!(store.load_source("ch-1").await, Err(StoreError::NotFound(_))));
    assert!(store.load_result("ch-2", Stage::Align).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_insertChapter_withEditedSource_shouldRequireNewTranslation() -> Result<()> {
    let store = Arc::new(SqliteChapterStore::new_in_memory()?);
    let original = store.insert_chapter("ch-1", &prose_chapter(2, 2), "en").await?;
    let orchestrator = orchestrator(&test_config(4000), Arc::new(MockProvider::working()), store.clone());

    orchestrator
        .process_stage("ch-1", Stage::Translate, &CancellationFlag::new())
        .await?;
    assert!(store.load_result("ch-1", Stage::Translate).await?.is_some());

    let edited = store.insert_chapter("ch-1", &prose_chapter(3, 2), "en").await?;

    assert_ne!(edited.source_hash, original.source_hash);
    assert!(store.load_result("ch-1", Stage::Translate).await?.is_none());
    assert_eq!(store.load_source("ch-1").await?.as_str(), prose_chapter(3, 2));
    Ok(())
}

#[tokio::test]
async fn test_processStage_withUnknownChapter_shouldReturnStoreError() -> Result<()> {
    let store = Arc::new(SqliteChapterStore::new_in_memory()?);
    let orchestrator = orchestrator(&test_config(4000), Arc::new(MockProvider::working()), store);

    let result = orchestrator
        .process_stage("missing", Stage::Translate, &CancellationFlag::new())
        .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("missing"));
    Ok(())
}
