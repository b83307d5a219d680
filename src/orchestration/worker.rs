/*!
 * Worker pool for chapter-stage jobs.
 *
 * Jobs run concurrently up to the configured limit. Chapters are independent
 * and finish in any order; results are returned in job order. Duplicate jobs
 * for a pair that is already being attempted are skipped by the retry store.
 */

use futures::stream::{self, StreamExt};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::OrchestrationError;
use crate::persistence::ChapterStore;
use crate::providers::TransformProvider;

use super::cancellation::CancellationFlag;
use super::orchestrator::{ChapterOrchestrator, StageRun};
use super::state::Stage;
use super::stats::UsageStats;

/// A queued unit of work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    /// Chapter identifier
    pub chapter_id: String,
    /// Stage to run
    pub stage: Stage,
}

impl Job {
    /// Create a job
    pub fn new(chapter_id: impl Into<String>, stage: Stage) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            stage,
        }
    }
}

/// Everything a pool run produced
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Stage runs, in job order
    pub runs: Vec<StageRun>,
    /// Jobs that failed with a non-retryable error
    pub errors: Vec<(Job, OrchestrationError)>,
    /// Merged usage of all runs
    pub stats: UsageStats,
}

impl PoolReport {
    /// Runs whose stage ran out of attempts
    pub fn needing_review(&self) -> Vec<&StageRun> {
        self.runs.iter().filter(|run| run.needs_review()).collect()
    }

    /// Number of accepted stages
    pub fn accepted(&self) -> usize {
        self.runs.iter().filter(|run| run.is_accepted()).count()
    }
}

/// Bounded-concurrency runner for chapter jobs
pub struct WorkerPool<P, S> {
    orchestrator: Arc<ChapterOrchestrator<P, S>>,
    concurrency: usize,
}

impl<P: TransformProvider, S: ChapterStore> WorkerPool<P, S> {
    /// Create a pool running up to `concurrency` jobs at once
    pub fn new(orchestrator: Arc<ChapterOrchestrator<P, S>>, concurrency: usize) -> Self {
        Self {
            orchestrator,
            concurrency: concurrency.max(1),
        }
    }

    /// The orchestrator jobs run on
    pub fn orchestrator(&self) -> &Arc<ChapterOrchestrator<P, S>> {
        &self.orchestrator
    }

    /// Run every job's stage to completion
    pub async fn run(&self, jobs: Vec<Job>, cancel: &CancellationFlag) -> PoolReport {
        let total_jobs = jobs.len();
        let start_time = Instant::now();
        info!("Running {} job(s) with {} worker(s)", total_jobs, self.concurrency);

        let mut results = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| {
                let orchestrator = self.orchestrator.clone();
                async move {
                    let result = orchestrator.process_stage(&job.chapter_id, job.stage, cancel).await;
                    (index, job, result.map(|run| vec![run]))
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _, _)| *index);
        let report = Self::collect(results);

        info!(
            "Finished {} job(s) in {:?}: {} accepted, {} need review, {} failed",
            total_jobs,
            start_time.elapsed(),
            report.accepted(),
            report.needing_review().len(),
            report.errors.len()
        );
        report
    }

    /// Run both stages of each chapter
    pub async fn run_chapters(&self, chapter_ids: &[String], cancel: &CancellationFlag) -> PoolReport {
        info!("Processing {} chapter(s) with {} worker(s)", chapter_ids.len(), self.concurrency);

        let mut results = stream::iter(chapter_ids.iter().enumerate())
            .map(|(index, chapter_id)| {
                let orchestrator = self.orchestrator.clone();
                async move {
                    let result = orchestrator.process_chapter(chapter_id, cancel).await;
                    (index, Job::new(chapter_id.as_str(), Stage::Translate), result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _, _)| *index);
        Self::collect(results)
    }

    fn collect(results: Vec<(usize, Job, Result<Vec<StageRun>, OrchestrationError>)>) -> PoolReport {
        let mut report = PoolReport::default();

        for (_, job, result) in results {
            match result {
                Ok(runs) => {
                    for run in runs {
                        report.stats.merge(&run.stats);
                        report.runs.push(run);
                    }
                }
                Err(e) => {
                    error!("Job {} ({}) failed: {}", job.chapter_id, job.stage, e);
                    report.errors.push((job, e));
                }
            }
        }

        report
    }
}
