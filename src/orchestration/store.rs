/*!
 * The retry state store.
 *
 * This is the only mutable state shared between workers. Every change goes
 * through one of four operations, each done under a single lock:
 * - `submit`: atomic claim; returns `None` when the pair is already being
 *   attempted or is exhausted
 * - `report`: resolves a claim into `Accepted`, `Retrying` or `Exhausted`
 * - `release`: gives a claim back on cancellation without counting it
 * - `reset`: clears a pair so an operator can re-run it
 *
 * A pair only has an entry while an attempt is in flight or after a failure.
 * Acceptance drops the entry; callers that must not redo accepted work check
 * for a saved result before claiming.
 */

use chrono::Utc;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::OrchestrationError;

use super::policy::RetryPolicy;
use super::state::{AttemptHandle, AttemptOutcome, AttemptPhase, RetryState, Stage, Transition};

/// A pair's state plus its active claim
#[derive(Debug)]
struct Entry {
    state: RetryState,
    active_attempt: Option<String>,
    phase_before_claim: AttemptPhase,
}

/// Thread-safe store of retry states keyed by (chapter, stage)
#[derive(Debug)]
pub struct RetryStore {
    policy: RetryPolicy,
    entries: Mutex<HashMap<(String, Stage), Entry>>,
}

impl RetryStore {
    /// Create an empty store
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The policy used to parameterize claims
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Claim the next attempt of a pair.
    ///
    /// Returns `None` if an attempt is already in flight or the pair is
    /// terminal; the caller must then do nothing.
    pub fn submit(&self, chapter_id: &str, stage: Stage) -> Option<AttemptHandle> {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry((chapter_id.to_string(), stage))
            .or_insert_with(|| Entry {
                state: RetryState::new(chapter_id, stage, self.policy.max_attempts()),
                active_attempt: None,
                phase_before_claim: AttemptPhase::Idle,
            });

        if !entry.state.phase.is_claimable() {
            debug!(
                "Claim of {} ({}) ignored: phase is {}",
                chapter_id, stage, entry.state.phase
            );
            return None;
        }

        let attempt = entry.state.attempts + 1;
        let attempt_id = Uuid::new_v4().to_string();

        entry.phase_before_claim = entry.state.phase;
        entry.state.phase = AttemptPhase::Attempting;
        entry.state.updated_at = Utc::now();
        entry.active_attempt = Some(attempt_id.clone());

        debug!(
            "Claimed attempt {}/{} of {} ({})",
            attempt, entry.state.max_attempts, chapter_id, stage
        );

        Some(AttemptHandle {
            chapter_id: chapter_id.to_string(),
            stage,
            attempt_id,
            attempt,
            params: self.policy.params_for(stage, attempt),
        })
    }

    /// Resolve a claimed attempt
    pub fn report(&self, handle: &AttemptHandle, outcome: AttemptOutcome) -> Result<Transition, OrchestrationError> {
        let mut entries = self.entries.lock();
        let entry = Self::active_entry(&mut entries, handle)?;

        entry.state.attempts += 1;
        entry.state.updated_at = Utc::now();
        entry.active_attempt = None;
        let attempts = entry.state.attempts;

        let transition = match outcome {
            AttemptOutcome::Accepted => {
                info!("{} ({}) accepted after {} attempt(s)", handle.chapter_id, handle.stage, attempts);
                Transition::Accepted { attempts }
            }
            AttemptOutcome::Failed(reason) => {
                let transition = if attempts < entry.state.max_attempts {
                    let remaining = entry.state.max_attempts - attempts;
                    warn!(
                        "{} ({}) attempt {} failed, {} left: {}",
                        handle.chapter_id, handle.stage, attempts, remaining, reason
                    );
                    Transition::Retrying { attempts, remaining }
                } else {
                    error!(
                        "{} ({}) exhausted after {} attempts, needs manual review: {}",
                        handle.chapter_id, handle.stage, attempts, reason
                    );
                    Transition::Exhausted { attempts }
                };
                entry.state.last_failure = Some(reason);
                transition
            }
        };

        if let Transition::Accepted { .. } = transition {
            entries.remove(&(handle.chapter_id.clone(), handle.stage));
        } else {
            entry.state.phase = transition.phase();
        }
        Ok(transition)
    }

    /// Give back a claim without counting it.
    ///
    /// The previous phase is restored; a pair that never failed is forgotten.
    pub fn release(&self, handle: &AttemptHandle) -> Result<(), OrchestrationError> {
        let mut entries = self.entries.lock();
        let entry = Self::active_entry(&mut entries, handle)?;

        if entry.state.attempts == 0 {
            entries.remove(&(handle.chapter_id.clone(), handle.stage));
            info!(
                "Released attempt {} of {} ({}); nothing recorded",
                handle.attempt, handle.chapter_id, handle.stage
            );
            return Ok(());
        }

        entry.state.phase = entry.phase_before_claim;
        entry.state.updated_at = Utc::now();
        entry.active_attempt = None;

        info!(
            "Released attempt {} of {} ({}); back to {}",
            handle.attempt, handle.chapter_id, handle.stage, entry.state.phase
        );
        Ok(())
    }

    /// Forget a pair so it can be attempted again from scratch.
    ///
    /// Returns false when the pair is unknown or an attempt is in flight.
    pub fn reset(&self, chapter_id: &str, stage: Stage) -> bool {
        let mut entries = self.entries.lock();
        let key = (chapter_id.to_string(), stage);

        match entries.get(&key) {
            Some(entry) if entry.state.phase != AttemptPhase::Attempting => {
                entries.remove(&key);
                info!("Reset retry state of {} ({})", chapter_id, stage);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of a pair's state (`None` when never failed or accepted)
    pub fn state(&self, chapter_id: &str, stage: Stage) -> Option<RetryState> {
        self.entries
            .lock()
            .get(&(chapter_id.to_string(), stage))
            .map(|entry| entry.state.clone())
    }

    /// Current phase of a pair (`Idle` when it has no entry)
    pub fn phase(&self, chapter_id: &str, stage: Stage) -> AttemptPhase {
        self.entries
            .lock()
            .get(&(chapter_id.to_string(), stage))
            .map(|entry| entry.state.phase)
            .unwrap_or_default()
    }

    /// Snapshot of every pair
    pub fn snapshot(&self) -> Vec<RetryState> {
        self.entries.lock().values().map(|entry| entry.state.clone()).collect()
    }

    /// Pairs waiting for manual review
    pub fn needing_review(&self) -> Vec<RetryState> {
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.state.needs_manual_review())
            .map(|entry| entry.state.clone())
            .collect()
    }

    fn active_entry<'a>(
        entries: &'a mut HashMap<(String, Stage), Entry>,
        handle: &AttemptHandle,
    ) -> Result<&'a mut Entry, OrchestrationError> {
        let entry = entries
            .get_mut(&(handle.chapter_id.clone(), handle.stage))
            .ok_or_else(|| OrchestrationError::UnknownAttempt {
                chapter_id: handle.chapter_id.clone(),
                stage: handle.stage.to_string(),
            })?;

        if entry.state.phase != AttemptPhase::Attempting
            || entry.active_attempt.as_deref() != Some(handle.attempt_id.as_str())
        {
            return Err(OrchestrationError::StaleHandle {
                chapter_id: handle.chapter_id.clone(),
                stage: handle.stage.to_string(),
                attempt_id: handle.attempt_id.clone(),
            });
        }

        Ok(entry)
    }
}

impl Default for RetryStore {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
