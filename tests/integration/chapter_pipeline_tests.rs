/*!
 * End-to-end tests of chapter processing over the in-memory store
 */

use std::sync::Arc;

use chapterguard::errors::ProviderError;
use chapterguard::orchestration::{
    AttemptPhase, CancellationFlag, FailureReason, RetryConfig, RunOutcome, Stage, StageRun, Transition,
};
use chapterguard::persistence::{ChapterStore, MemoryChapterStore, StageReport};
use chapterguard::providers::TransformTask;
use chapterguard::providers::mock::MockProvider;

use crate::common::mock_providers::{RecoveringProvider, merge_paragraphs, shouting_provider};
use crate::common::{init_test_logging, orchestrator, prose_chapter, test_config};

fn store_with(chapter_id: &str, text: &str) -> Arc<MemoryChapterStore> {
    let store = Arc::new(MemoryChapterStore::new());
    store.insert_source(chapter_id, text, "en");
    store
}

#[tokio::test]
async fn test_processChapter_withFaithfulProvider_shouldStoreTranslationAndAlignment() {
    init_test_logging();
    let chapter = prose_chapter(6, 3);
    let store = store_with("ch-1", &chapter);
    let provider = Arc::new(shouting_provider());
    let config = test_config(400).with_languages("en", "fr");
    let orchestrator = orchestrator(&config, provider.clone(), store.clone());

    let runs = orchestrator.process_chapter("ch-1", &CancellationFlag::new()).await.unwrap();

    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(StageRun::is_accepted));

    let translation = store.load_result("ch-1", Stage::Translate).await.unwrap().unwrap();
    assert_eq!(translation.text, chapter.to_uppercase());
    assert_eq!(translation.segments.len(), 3);
    assert!(translation.validation_report().is_some_and(|r| r.valid));

    let alignment = store.load_result("ch-1", Stage::Align).await.unwrap().unwrap();
    let report = alignment.alignment_report().unwrap();
    assert_eq!(report.pairs.len(), 18);
    assert_eq!(report.coverage_source, 1.0);
    assert!(!report.needs_review);

    // Alignment of an accepted translation starts locally
    assert_eq!(provider.request_count(), 3);
    assert!(provider.requests().iter().all(|r| r.task == TransformTask::Translate));
    assert!(provider.requests()[0].instructions.contains("French"));
    assert_eq!(runs[1].stats.provider_calls, 0);
}

#[tokio::test]
async fn test_processChapter_withParagraphMergingProvider_shouldEscalateToReview() {
    let store = store_with("ch-merge", &prose_chapter(6, 3));
    let provider = Arc::new(MockProvider::working().with_custom_response(merge_paragraphs));
    let orchestrator = orchestrator(&test_config(400), provider.clone(), store.clone());

    let runs = orchestrator
        .process_chapter("ch-merge", &CancellationFlag::new())
        .await
        .unwrap();

    // Align never runs without an accepted translation
    assert_eq!(runs.len(), 1);
    assert!(runs[0].needs_review());
    assert_eq!(runs[0].stats.attempts, 3);
    assert_eq!(runs[0].stats.rejected_attempts, 3);

    let state = orchestrator.retry_store().state("ch-merge", Stage::Translate).unwrap();
    assert_eq!(state.phase, AttemptPhase::Exhausted);
    match state.last_failure {
        Some(FailureReason::Conservation(report)) => {
            assert!(report.paragraph_ratio < 0.6);
            assert!(report.length_ratio > 0.9);
        }
        other => panic!("unexpected failure: {:?}", other),
    }
    assert!(store.load_result("ch-merge", Stage::Translate).await.unwrap().is_none());
    assert_eq!(orchestrator.retry_store().phase("ch-merge", Stage::Align), AttemptPhase::Idle);
}

#[tokio::test]
async fn test_processStage_withTruncationOnFirstCall_shouldRecoverWithSmallerChunks() {
    let chapter = prose_chapter(6, 3);
    let store = store_with("ch-2", &chapter);
    let provider = Arc::new(RecoveringProvider::new(1));
    let config = test_config(400).with_retry(RetryConfig {
        min_chunk_chars: 50,
        ..Default::default()
    });
    let orchestrator = orchestrator(&config, provider.clone(), store.clone());

    let run = orchestrator
        .process_stage("ch-2", Stage::Translate, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(run.outcome, RunOutcome::Resolved(Transition::Accepted { attempts: 2 }));
    assert_eq!(run.stats.rejected_attempts, 1);

    // Attempt 1 stops at its first chunk; attempt 2 sends one paragraph per chunk
    assert_eq!(provider.calls(), 7);
    let translation = store.load_result("ch-2", Stage::Translate).await.unwrap().unwrap();
    assert_eq!(translation.attempt, 2);
    assert_eq!(translation.segments.len(), 6);
    assert_eq!(translation.text, chapter);
}

#[tokio::test]
async fn test_processStage_withThreeFailures_shouldExhaustAndAllowOperatorReset() {
    let store = store_with("ch-f", &prose_chapter(2, 2));
    let provider = Arc::new(MockProvider::scripted(vec![
        Err(ProviderError::Timeout(30)),
        Err(ProviderError::RateLimitExceeded("slow down".to_string())),
        Err(ProviderError::ConnectionError("reset by peer".to_string())),
    ]));
    let orchestrator = orchestrator(&test_config(4000), provider.clone(), store.clone());
    let cancel = CancellationFlag::new();

    let run = orchestrator.process_stage("ch-f", Stage::Translate, &cancel).await.unwrap();

    assert_eq!(run.outcome, RunOutcome::Resolved(Transition::Exhausted { attempts: 3 }));
    assert_eq!(run.stats.provider_failures, 3);
    assert_eq!(provider.request_count(), 3);

    // No fourth attempt while exhausted
    let skipped = orchestrator.run_attempt("ch-f", Stage::Translate, &cancel).await.unwrap();
    assert_eq!(skipped.outcome, RunOutcome::Skipped);
    assert_eq!(provider.request_count(), 3);
    let review = orchestrator.retry_store().needing_review();
    assert_eq!(review.len(), 1);
    assert_eq!(review[0].chapter_id, "ch-f");

    assert!(orchestrator.retry_store().reset("ch-f", Stage::Translate));
    let rerun = orchestrator.process_stage("ch-f", Stage::Translate, &cancel).await.unwrap();

    assert_eq!(rerun.outcome, RunOutcome::Resolved(Transition::Accepted { attempts: 1 }));
    assert_eq!(provider.request_count(), 4);
}

#[tokio::test]
async fn test_processChapter_withEmptyResponses_shouldNeverAccept() {
    let store = store_with("ch-e", &prose_chapter(3, 2));
    let provider = Arc::new(MockProvider::empty());
    let orchestrator = orchestrator(&test_config(4000), provider.clone(), store.clone());

    let runs = orchestrator.process_chapter("ch-e", &CancellationFlag::new()).await.unwrap();

    assert!(runs[0].needs_review());
    assert!(store.load_result("ch-e", Stage::Translate).await.unwrap().is_none());
    assert_eq!(store.result_count(), 0);
}

#[tokio::test]
async fn test_processChapter_whenCancelledUpfront_shouldNotCallProvider() {
    let store = store_with("ch-c", &prose_chapter(3, 2));
    let provider = Arc::new(MockProvider::working());
    let orchestrator = orchestrator(&test_config(4000), provider.clone(), store.clone());
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let runs = orchestrator.process_chapter("ch-c", &cancel).await.unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].outcome, RunOutcome::Cancelled);
    assert_eq!(provider.request_count(), 0);
    assert!(orchestrator.retry_store().state("ch-c", Stage::Translate).is_none());
}

#[tokio::test]
async fn test_translationResult_shouldKeepValidationReportForAudit() {
    let store = store_with("ch-a", &prose_chapter(2, 3));
    let orchestrator = orchestrator(&test_config(4000), Arc::new(MockProvider::working()), store.clone());

    orchestrator
        .process_stage("ch-a", Stage::Translate, &CancellationFlag::new())
        .await
        .unwrap();

    let result = store.load_result("ch-a", Stage::Translate).await.unwrap().unwrap();
    match result.report {
        StageReport::Validation(report) => {
            assert_eq!(report.length_ratio, 1.0);
            assert_eq!(report.original_paragraph_count, 2);
        }
        other => panic!("unexpected report: {:?}", other),
    }
}
