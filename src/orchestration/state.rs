/*!
 * Retry state machine types.
 *
 * Each (chapter, stage) pair moves through
 * `Idle -> Attempting -> {Accepted | Retrying -> Attempting | Exhausted}`.
 * `Accepted` and `Exhausted` are terminal. An accepted pair's state is
 * dropped; an exhausted pair keeps a compact failure summary until an
 * operator resets it.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::alignment::AlignmentReport;
use crate::errors::ProviderError;
use crate::validation::ValidationReport;

use super::policy::AttemptParams;

/// Pipeline stage of a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Transform the source text chunk by chunk
    Translate,
    /// Align the accepted transformation with its source
    Align,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Translate => write!(f, "translate"),
            Stage::Align => write!(f, "align"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "translate" => Ok(Stage::Translate),
            "align" => Ok(Stage::Align),
            _ => Err(anyhow::anyhow!("Invalid stage: {}", s)),
        }
    }
}

/// Phase of a (chapter, stage) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    /// Never attempted
    #[default]
    Idle,
    /// An attempt is in flight
    Attempting,
    /// Last attempt failed; another one is allowed
    Retrying,
    /// Output accepted
    Accepted,
    /// Attempt budget spent; needs manual review
    Exhausted,
}

impl AttemptPhase {
    /// Whether no further automatic attempts are made
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptPhase::Accepted | AttemptPhase::Exhausted)
    }

    /// Whether a new attempt may be claimed
    pub fn is_claimable(&self) -> bool {
        matches!(self, AttemptPhase::Idle | AttemptPhase::Retrying)
    }
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptPhase::Idle => write!(f, "idle"),
            AttemptPhase::Attempting => write!(f, "attempting"),
            AttemptPhase::Retrying => write!(f, "retrying"),
            AttemptPhase::Accepted => write!(f, "accepted"),
            AttemptPhase::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Ratios and counts of a rejected validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationFailure {
    pub length_ratio: f64,
    pub paragraph_ratio: f64,
    pub original_paragraph_count: usize,
    pub transformed_paragraph_count: usize,
    pub critical_issues: Vec<String>,
}

impl From<&ValidationReport> for ConservationFailure {
    fn from(report: &ValidationReport) -> Self {
        Self {
            length_ratio: report.length_ratio,
            paragraph_ratio: report.paragraph_ratio,
            original_paragraph_count: report.original_paragraph_count,
            transformed_paragraph_count: report.transformed_paragraph_count,
            critical_issues: report.critical_issues.clone(),
        }
    }
}

/// Coverage and quality numbers of a rejected alignment, without its pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentShortfall {
    pub pair_count: usize,
    pub coverage_source: f64,
    pub coverage_target: f64,
    pub quality_score: f64,
    pub misalignment_count: usize,
    pub duplication_detected: bool,
    pub out_of_order_count: usize,
}

impl From<&AlignmentReport> for AlignmentShortfall {
    fn from(report: &AlignmentReport) -> Self {
        Self {
            pair_count: report.pairs.len(),
            coverage_source: report.coverage_source,
            coverage_target: report.coverage_target,
            quality_score: report.quality_score,
            misalignment_count: report.misalignment_count,
            duplication_detected: report.duplication_detected,
            out_of_order_count: report.out_of_order_count,
        }
    }
}

/// Why an attempt failed. Each variant keeps the numbers behind the decision.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Length or paragraph ratio was critical
    Conservation(ConservationFailure),
    /// Coverage or quality below the floor
    AlignmentInsufficient(AlignmentShortfall),
    /// The provider call failed
    Provider(ProviderError),
}

impl FailureReason {
    pub fn conservation(report: &ValidationReport) -> Self {
        FailureReason::Conservation(report.into())
    }

    pub fn alignment(report: &AlignmentReport) -> Self {
        FailureReason::AlignmentInsufficient(report.into())
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Conservation(failure) => write!(
                f,
                "conservation failure: {} (length ratio {:.3}, paragraph ratio {:.3})",
                failure.critical_issues.join("; "),
                failure.length_ratio,
                failure.paragraph_ratio
            ),
            FailureReason::AlignmentInsufficient(shortfall) => write!(
                f,
                "alignment insufficient: {} pairs, coverage {:.3}/{:.3}, quality {:.3}, {} misaligned, {} out of order{}",
                shortfall.pair_count,
                shortfall.coverage_source,
                shortfall.coverage_target,
                shortfall.quality_score,
                shortfall.misalignment_count,
                shortfall.out_of_order_count,
                if shortfall.duplication_detected { ", duplication detected" } else { "" }
            ),
            FailureReason::Provider(error) => write!(f, "provider failure: {}", error),
        }
    }
}

/// Result of executing one claimed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Output passed validation or alignment
    Accepted,
    /// Output was rejected or never produced
    Failed(FailureReason),
}

/// Retry bookkeeping for one (chapter, stage) pair
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState {
    /// Chapter identifier
    pub chapter_id: String,
    /// Stage
    pub stage: Stage,
    /// Attempts resolved so far
    pub attempts: u32,
    /// Attempt cap
    pub max_attempts: u32,
    /// Reason of the most recent failure
    pub last_failure: Option<FailureReason>,
    /// Current phase
    pub phase: AttemptPhase,
    /// Last change
    pub updated_at: DateTime<Utc>,
}

impl RetryState {
    /// Create the state of a pair that was never attempted
    pub fn new(chapter_id: &str, stage: Stage, max_attempts: u32) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            stage,
            attempts: 0,
            max_attempts,
            last_failure: None,
            phase: AttemptPhase::Idle,
            updated_at: Utc::now(),
        }
    }

    /// Attempts still allowed
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// Whether the pair is waiting for an operator
    pub fn needs_manual_review(&self) -> bool {
        self.phase == AttemptPhase::Exhausted
    }
}

/// A claimed attempt. Only the holder may report or release it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptHandle {
    /// Chapter identifier
    pub chapter_id: String,
    /// Stage
    pub stage: Stage,
    /// Unique id of this claim
    pub attempt_id: String,
    /// 1-based attempt number
    pub attempt: u32,
    /// Parameters chosen by the retry policy for this attempt
    pub params: AttemptParams,
}

/// State change caused by reporting an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Output accepted after `attempts` attempts
    Accepted { attempts: u32 },
    /// Failed; `remaining` attempts left
    Retrying { attempts: u32, remaining: u32 },
    /// Failed and out of attempts
    Exhausted { attempts: u32 },
}

impl Transition {
    /// Phase the pair is in after the transition
    pub fn phase(&self) -> AttemptPhase {
        match self {
            Transition::Accepted { .. } => AttemptPhase::Accepted,
            Transition::Retrying { .. } => AttemptPhase::Retrying,
            Transition::Exhausted { .. } => AttemptPhase::Exhausted,
        }
    }
}
