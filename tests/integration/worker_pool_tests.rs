/*!
 * Tests of concurrent chapter processing
 */

use std::sync::Arc;

use chapterguard::orchestration::{
    AttemptPhase, CancellationFlag, ChapterOrchestrator, Job, RunOutcome, Stage, WorkerPool,
};
use chapterguard::persistence::MemoryChapterStore;
use chapterguard::providers::TransformRequest;
use chapterguard::providers::mock::MockProvider;

use crate::common::{init_test_logging, orchestrator, prose_chapter, test_config};

/// Echoes every chunk except those of chapters marked broken, which lose three quarters
fn break_marked(request: &TransformRequest) -> String {
    if request.text.contains("BROKEN") {
        request.text.chars().take(request.text.chars().count() / 4).collect()
    } else {
        request.text.clone()
    }
}

fn chapter_ids(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("ch-{:02}", i)).collect()
}

fn pool_over(
    provider: MockProvider,
    chapters: &[(String, String)],
    concurrency: usize,
) -> WorkerPool<MockProvider, MemoryChapterStore> {
    let store = Arc::new(MemoryChapterStore::new());
    for (id, text) in chapters {
        store.insert_source(id, text, "en");
    }
    let config = test_config(4000).with_concurrent_chapters(concurrency);
    let orchestrator: ChapterOrchestrator<_, _> = orchestrator(&config, Arc::new(provider), store);
    WorkerPool::new(Arc::new(orchestrator), config.worker.concurrent_chapters)
}

#[tokio::test]
async fn test_runChapters_withOneBrokenChapter_shouldIsolateItForReview() {
    init_test_logging();
    let ids = chapter_ids(6);
    let chapters: Vec<(String, String)> = ids
        .iter()
        .map(|id| {
            let text = if id == "ch-04" {
                format!("BROKEN chapter.\n\n{}", prose_chapter(3, 2))
            } else {
                prose_chapter(3, 2)
            };
            (id.clone(), text)
        })
        .collect();
    let provider = MockProvider::working().with_custom_response(break_marked);
    let pool = pool_over(provider.clone(), &chapters, 3);

    let report = pool.run_chapters(&ids, &CancellationFlag::new()).await;

    assert!(report.errors.is_empty());
    assert_eq!(report.runs.len(), 11);
    assert_eq!(report.accepted(), 10);

    let review = report.needing_review();
    assert_eq!(review.len(), 1);
    assert_eq!(review[0].chapter_id, "ch-04");
    assert_eq!(review[0].stage, Stage::Translate);

    let retries = pool.orchestrator().retry_store();
    assert_eq!(retries.phase("ch-04", Stage::Translate), AttemptPhase::Exhausted);
    // Accepted pairs leave no retry state behind
    assert!(retries.state("ch-05", Stage::Align).is_none());
    assert_eq!(retries.snapshot().len(), 1);

    // Five chapters in one call each, plus three attempts on the broken one
    assert_eq!(provider.request_count(), 8);
    assert_eq!(report.stats.provider_calls, 8);
    assert_eq!(report.stats.rejected_attempts, 3);
}

#[tokio::test]
async fn test_run_withSlowProvider_shouldReturnRunsInJobOrder() {
    let ids = chapter_ids(8);
    let chapters: Vec<(String, String)> = ids.iter().map(|id| (id.clone(), prose_chapter(2, 2))).collect();
    let pool = pool_over(MockProvider::slow(5), &chapters, 4);
    let jobs: Vec<Job> = ids.iter().rev().map(|id| Job::new(id.as_str(), Stage::Translate)).collect();

    let report = pool.run(jobs, &CancellationFlag::new()).await;

    let order: Vec<&str> = report.runs.iter().map(|run| run.chapter_id.as_str()).collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(order, expected);
    assert_eq!(report.accepted(), 8);
}

#[tokio::test]
async fn test_run_withSequentialAndConcurrentPools_shouldAgree() {
    let ids = chapter_ids(5);
    let chapters: Vec<(String, String)> = ids.iter().map(|id| (id.clone(), prose_chapter(4, 3))).collect();

    let sequential = pool_over(MockProvider::working(), &chapters, 1)
        .run_chapters(&ids, &CancellationFlag::new())
        .await;
    let concurrent = pool_over(MockProvider::working(), &chapters, 5)
        .run_chapters(&ids, &CancellationFlag::new())
        .await;

    assert_eq!(sequential.accepted(), concurrent.accepted());
    assert_eq!(sequential.stats.provider_calls, concurrent.stats.provider_calls);
    assert_eq!(sequential.stats.chars_in, concurrent.stats.chars_in);
}

#[tokio::test]
async fn test_run_whenCancelled_shouldNotClaimAnything() {
    let ids = chapter_ids(3);
    let chapters: Vec<(String, String)> = ids.iter().map(|id| (id.clone(), prose_chapter(2, 2))).collect();
    let provider = MockProvider::working();
    let pool = pool_over(provider.clone(), &chapters, 2);
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let report = pool.run_chapters(&ids, &cancel).await;

    assert_eq!(report.runs.len(), 3);
    assert!(report.runs.iter().all(|run| run.outcome == RunOutcome::Cancelled));
    assert_eq!(provider.request_count(), 0);
    assert!(pool.orchestrator().retry_store().snapshot().is_empty());
}
