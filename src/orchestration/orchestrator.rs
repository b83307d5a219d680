/*!
 * Chapter orchestration.
 *
 * `ChapterOrchestrator` drives one (chapter, stage) pair through the retry
 * state machine: claim an attempt, run it, report the outcome. A translate
 * attempt segments the source, calls the provider chunk by chunk in source
 * order, validates, reassembles and validates the whole chapter. An align
 * attempt aligns the accepted translation, first with the local aligner and
 * on retries with pairs proposed by the provider.
 *
 * Cancellation is checked between provider calls. A cancelled attempt is
 * released, not counted; chunk outputs that already passed validation are
 * kept and reused by the next attempt with the same chunk size.
 */

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::alignment::{Aligner, AlignmentConfig, parse_proposals};
use crate::app_config::Config;
use crate::errors::{OrchestrationError, ProviderError};
use crate::persistence::{ChapterStore, SegmentPair, StageReport, StageResult};
use crate::providers::prompts::build_instructions;
use crate::providers::{TransformProvider, TransformRequest, TransformResponse, TransformTask};
use crate::segmentation::{Segmenter, SourceText, char_len};
use crate::validation::IntegrityValidator;

use super::cancellation::CancellationFlag;
use super::state::{AttemptHandle, AttemptOutcome, FailureReason, Stage, Transition};
use super::stats::UsageStats;
use super::store::RetryStore;

/// What happened to a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The pair was already accepted, being attempted or exhausted
    Skipped,
    /// Cancelled before the attempt resolved; nothing was counted
    Cancelled,
    /// The attempt resolved into a transition
    Resolved(Transition),
}

/// Result of running one stage of one chapter
#[derive(Debug, Clone)]
pub struct StageRun {
    /// Chapter identifier
    pub chapter_id: String,
    /// Stage that ran
    pub stage: Stage,
    /// Final outcome
    pub outcome: RunOutcome,
    /// Provider usage of the run
    pub stats: UsageStats,
}

impl StageRun {
    fn new(chapter_id: &str, stage: Stage, outcome: RunOutcome, stats: UsageStats) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            stage,
            outcome,
            stats,
        }
    }

    /// Whether the stage was accepted by this run
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Resolved(Transition::Accepted { .. }))
    }

    /// Whether the stage ran out of attempts
    pub fn needs_review(&self) -> bool {
        matches!(self.outcome, RunOutcome::Resolved(Transition::Exhausted { .. }))
    }
}

/// How an attempt ended, before it is reported
enum Execution {
    Finished(AttemptOutcome),
    Cancelled,
}

/// Chunk outputs kept from a cancelled translate attempt
#[derive(Debug)]
struct PartialTranslation {
    max_chunk_chars: usize,
    segments: Vec<SegmentPair>,
}

/// Drives chapters through the translate and align stages
pub struct ChapterOrchestrator<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    retries: Arc<RetryStore>,
    validator: IntegrityValidator,
    alignment: AlignmentConfig,
    target_language: String,
    partials: Mutex<HashMap<String, PartialTranslation>>,
}

impl<P: TransformProvider, S: ChapterStore> ChapterOrchestrator<P, S> {
    /// Create an orchestrator from a validated configuration
    pub fn new(config: &Config, provider: Arc<P>, store: Arc<S>) -> Result<Self, OrchestrationError> {
        config
            .validate()
            .map_err(|e| OrchestrationError::InvalidConfig(format!("{:#}", e)))?;

        Ok(Self {
            provider,
            store,
            retries: Arc::new(RetryStore::new(config.retry_policy())),
            validator: IntegrityValidator::with_config(config.validation.clone()),
            alignment: config.alignment.clone(),
            target_language: config.target_language.clone(),
            partials: Mutex::new(HashMap::new()),
        })
    }

    /// Use a shared retry store
    pub fn with_retry_store(mut self, retries: Arc<RetryStore>) -> Self {
        self.retries = retries;
        self
    }

    /// The retry store holding every pair's state
    pub fn retry_store(&self) -> &Arc<RetryStore> {
        &self.retries
    }

    /// The chapter store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run the translate stage, then the align stage once a translation is accepted
    pub async fn process_chapter(
        &self,
        chapter_id: &str,
        cancel: &CancellationFlag,
    ) -> Result<Vec<StageRun>, OrchestrationError> {
        let translate = self.process_stage(chapter_id, Stage::Translate, cancel).await?;
        let translated = translate.is_accepted()
            || self.store.load_result(chapter_id, Stage::Translate).await?.is_some();
        let mut runs = vec![translate];

        if translated {
            runs.push(self.process_stage(chapter_id, Stage::Align, cancel).await?);
        }

        Ok(runs)
    }

    /// Run attempts of a stage until it is accepted, exhausted, skipped or cancelled
    pub async fn process_stage(
        &self,
        chapter_id: &str,
        stage: Stage,
        cancel: &CancellationFlag,
    ) -> Result<StageRun, OrchestrationError> {
        let mut stats = UsageStats::new();

        loop {
            let run = self.run_attempt(chapter_id, stage, cancel).await?;
            stats.merge(&run.stats);

            if !matches!(run.outcome, RunOutcome::Resolved(Transition::Retrying { .. })) {
                return Ok(StageRun::new(chapter_id, stage, run.outcome, stats));
            }
        }
    }

    /// Claim, execute and report a single attempt
    pub async fn run_attempt(
        &self,
        chapter_id: &str,
        stage: Stage,
        cancel: &CancellationFlag,
    ) -> Result<StageRun, OrchestrationError> {
        let mut stats = UsageStats::new();

        if cancel.is_cancelled() {
            return Ok(StageRun::new(chapter_id, stage, RunOutcome::Cancelled, stats));
        }

        // Saved before acceptance is reported, so a finished pair is never claimed again
        if self.store.load_result(chapter_id, stage).await?.is_some() {
            debug!("{} ({}) already has a result", chapter_id, stage);
            return Ok(StageRun::new(chapter_id, stage, RunOutcome::Skipped, stats));
        }

        let Some(handle) = self.retries.submit(chapter_id, stage) else {
            return Ok(StageRun::new(chapter_id, stage, RunOutcome::Skipped, stats));
        };

        let execution = match stage {
            Stage::Translate => self.execute_translate(&handle, cancel, &mut stats).await,
            Stage::Align => self.execute_align(&handle, cancel, &mut stats).await,
        };

        let outcome = match execution {
            Ok(Execution::Finished(outcome)) => outcome,
            Ok(Execution::Cancelled) => {
                self.retries.release(&handle)?;
                return Ok(StageRun::new(chapter_id, stage, RunOutcome::Cancelled, stats));
            }
            Err(error) => {
                self.retries.release(&handle)?;
                return Err(error);
            }
        };

        stats.attempts += 1;
        if matches!(outcome, AttemptOutcome::Failed(_)) {
            stats.rejected_attempts += 1;
        }

        let transition = self.retries.report(&handle, outcome)?;
        Ok(StageRun::new(chapter_id, stage, RunOutcome::Resolved(transition), stats))
    }

    async fn load_source(&self, chapter_id: &str) -> Result<SourceText, OrchestrationError> {
        let source = self.store.load_source(chapter_id).await?;
        if source.is_blank() {
            return Err(OrchestrationError::EmptySource(chapter_id.to_string()));
        }
        Ok(source)
    }

    async fn execute_translate(
        &self,
        handle: &AttemptHandle,
        cancel: &CancellationFlag,
        stats: &mut UsageStats,
    ) -> Result<Execution, OrchestrationError> {
        let source = self.load_source(&handle.chapter_id).await?;
        let params = handle.params;
        let segmenter = Segmenter::for_language(source.language());
        let chunks = segmenter.segment(source.as_str(), params.max_chunk_chars)?;
        let total = chunks.len();
        let instructions = build_instructions(
            TransformTask::Translate,
            source.language(),
            &self.target_language,
            handle.attempt,
        );

        let mut kept = self
            .partials
            .lock()
            .remove(&handle.chapter_id)
            .filter(|partial| partial.max_chunk_chars == params.max_chunk_chars)
            .map(|partial| partial.segments)
            .unwrap_or_default()
            .into_iter();

        debug!(
            "Translating {} in {} chunk(s) of at most {} chars (attempt {})",
            handle.chapter_id, total, params.max_chunk_chars, handle.attempt
        );

        let mut segments: Vec<SegmentPair> = Vec::with_capacity(total);
        for chunk in chunks {
            if let Some(previous) = kept.next() {
                if previous.source == chunk.text {
                    debug!("Reusing kept output of chunk {} of {}", chunk.index + 1, handle.chapter_id);
                    segments.push(previous);
                    continue;
                }
                kept = Vec::new().into_iter();
            }

            if cancel.is_cancelled() {
                return Ok(self.cancel_translate(handle, params.max_chunk_chars, segments, total));
            }

            if chunk.text.trim().is_empty() {
                segments.push(SegmentPair {
                    source: chunk.text.clone(),
                    target: chunk.text,
                });
                continue;
            }

            if chunk.oversized {
                warn!(
                    "Sending oversized chunk {} of {} ({} chars)",
                    chunk.index + 1,
                    handle.chapter_id,
                    chunk.char_len
                );
            }

            let request = TransformRequest::translate(chunk.text.as_str(), instructions.as_str(), params.temperature);
            let response = match self.call_provider(request, chunk.char_len, stats).await {
                Ok(response) => response,
                Err(error) => return Ok(Execution::Finished(AttemptOutcome::Failed(FailureReason::Provider(error)))),
            };

            if cancel.is_cancelled() {
                debug!("Discarding in-flight output of chunk {} of {}", chunk.index + 1, handle.chapter_id);
                return Ok(self.cancel_translate(handle, params.max_chunk_chars, segments, total));
            }

            if self.validator.config().validate_chunks {
                let report = self.validator.validate(&chunk.text, &response.text);
                if !report.valid {
                    warn!(
                        "Chunk {}/{} of {} rejected: {}",
                        chunk.index + 1,
                        total,
                        handle.chapter_id,
                        report.summary()
                    );
                    return Ok(Execution::Finished(AttemptOutcome::Failed(FailureReason::conservation(&report))));
                }
            }

            segments.push(SegmentPair {
                source: chunk.text,
                target: response.text,
            });
        }

        let output = join_outputs(&segments);
        let report = self.validator.validate(source.as_str(), &output);
        if !report.valid {
            warn!("Translation of {} rejected: {}", handle.chapter_id, report.summary());
            return Ok(Execution::Finished(AttemptOutcome::Failed(FailureReason::conservation(&report))));
        }
        for warning in &report.warnings {
            warn!("Translation of {}: {}", handle.chapter_id, warning);
        }

        info!("Translation of {} validated: {}", handle.chapter_id, report.summary());

        self.store
            .save_result(
                &handle.chapter_id,
                StageResult {
                    stage: Stage::Translate,
                    text: output,
                    report: StageReport::Validation(report),
                    segments,
                    attempt: handle.attempt,
                },
            )
            .await?;

        Ok(Execution::Finished(AttemptOutcome::Accepted))
    }

    fn cancel_translate(
        &self,
        handle: &AttemptHandle,
        max_chunk_chars: usize,
        segments: Vec<SegmentPair>,
        total: usize,
    ) -> Execution {
        warn!(
            "Translation of {} cancelled; keeping {} of {} chunk(s)",
            handle.chapter_id,
            segments.len(),
            total
        );

        if !segments.is_empty() {
            self.partials.lock().insert(
                handle.chapter_id.clone(),
                PartialTranslation {
                    max_chunk_chars,
                    segments,
                },
            );
        }

        Execution::Cancelled
    }

    async fn execute_align(
        &self,
        handle: &AttemptHandle,
        cancel: &CancellationFlag,
        stats: &mut UsageStats,
    ) -> Result<Execution, OrchestrationError> {
        let source = self.load_source(&handle.chapter_id).await?;
        let translation = self
            .store
            .load_result(&handle.chapter_id, Stage::Translate)
            .await?
            .ok_or_else(|| OrchestrationError::MissingTranslation(handle.chapter_id.clone()))?;
        let aligner = Aligner::with_config(self.alignment.clone(), source.language(), &self.target_language);

        let report = if handle.params.regenerate_alignment {
            if cancel.is_cancelled() {
                return Ok(Execution::Cancelled);
            }

            let instructions = build_instructions(
                TransformTask::Align,
                source.language(),
                &self.target_language,
                handle.attempt,
            );
            let request = TransformRequest::align(
                source.as_str(),
                translation.text.as_str(),
                instructions,
                handle.params.temperature,
            );
            let chars_in = source.char_len() + char_len(&translation.text);
            let response = match self.call_provider(request, chars_in, stats).await {
                Ok(response) => response,
                Err(error) => return Ok(Execution::Finished(AttemptOutcome::Failed(FailureReason::Provider(error)))),
            };

            if cancel.is_cancelled() {
                return Ok(Execution::Cancelled);
            }

            match parse_proposals(&response.text) {
                Ok(proposals) => aligner.align_proposed(source.as_str(), &translation.text, &proposals),
                Err(error) => {
                    let error = ProviderError::ParseError(format!("alignment proposals: {}", error));
                    return Ok(Execution::Finished(AttemptOutcome::Failed(FailureReason::Provider(error))));
                }
            }
        } else if translation.segments.is_empty() {
            aligner.align(source.as_str(), &translation.text)
        } else {
            let pairs: Vec<(&str, &str)> = translation
                .segments
                .iter()
                .map(|segment| (segment.source.as_str(), segment.target.as_str()))
                .collect();
            aligner.align_chunks(&pairs)
        };

        if report.needs_review {
            warn!("Alignment of {} insufficient: {}", handle.chapter_id, report.summary());
            return Ok(Execution::Finished(AttemptOutcome::Failed(FailureReason::alignment(&report))));
        }

        info!("Alignment of {} accepted: {}", handle.chapter_id, report.summary());

        let segments = report
            .pairs
            .iter()
            .map(|pair| SegmentPair {
                source: pair.source_fragment.clone(),
                target: pair.target_fragment.clone(),
            })
            .collect();

        self.store
            .save_result(
                &handle.chapter_id,
                StageResult {
                    stage: Stage::Align,
                    text: translation.text,
                    report: StageReport::Alignment(report),
                    segments,
                    attempt: handle.attempt,
                },
            )
            .await?;

        Ok(Execution::Finished(AttemptOutcome::Accepted))
    }

    async fn call_provider(
        &self,
        request: TransformRequest,
        chars_in: usize,
        stats: &mut UsageStats,
    ) -> Result<TransformResponse, ProviderError> {
        let start_time = Instant::now();
        let result = self.provider.transform(request).await;
        let duration = start_time.elapsed();

        match &result {
            Ok(response) => stats.record_call(
                chars_in,
                char_len(&response.text),
                response.prompt_tokens,
                response.completion_tokens,
                duration,
            ),
            Err(e) => {
                stats.record_failure(chars_in, duration);
                error!("{} call failed after {:?}: {}", self.provider.name(), duration, e);
            }
        }

        result
    }
}

/// Join chunk outputs in source order.
///
/// Each output is trimmed and wrapped in the whitespace that surrounded its
/// chunk, so paragraph breaks between chunks survive providers that strip them.
/// A blank output contributes nothing.
fn join_outputs(segments: &[SegmentPair]) -> String {
    let mut output = String::new();

    for segment in segments {
        let content = segment.target.trim();
        if content.is_empty() {
            if segment.source.trim().is_empty() {
                output.push_str(&segment.source);
            }
            continue;
        }

        let leading = &segment.source[..segment.source.len() - segment.source.trim_start().len()];
        let trailing = &segment.source[segment.source.trim_end().len()..];
        output.push_str(leading);
        output.push_str(content);
        output.push_str(trailing);
    }

    output
}
