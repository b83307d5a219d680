/*!
 * Persisted chapter and stage-result models.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentReport;
use crate::orchestration::state::Stage;
use crate::validation::ValidationReport;

/// A chapter's source as stored
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRecord {
    /// Chapter identifier
    pub id: String,
    /// Full source text
    pub source_text: String,
    /// ISO language code of the source
    pub source_language: String,
    /// SHA-256 of the source text
    pub source_hash: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl ChapterRecord {
    /// Create a new chapter record
    pub fn new(id: String, source_text: String, source_language: String, source_hash: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id,
            source_text,
            source_language,
            source_hash,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A source chunk and the provider output it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPair {
    /// Chunk of the source text
    pub source: String,
    /// Validated provider output for the chunk
    pub target: String,
}

/// The report that justified accepting a stage result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageReport {
    /// Whole-chapter validation of a translation
    Validation(ValidationReport),
    /// Alignment of the accepted translation
    Alignment(AlignmentReport),
}

/// An accepted stage result
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    /// Stage that produced the result
    pub stage: Stage,
    /// The transformed chapter text
    pub text: String,
    /// Report the result was accepted on
    pub report: StageReport,
    /// Chunk-level pairs, in source order
    pub segments: Vec<SegmentPair>,
    /// Attempt number that produced the result
    pub attempt: u32,
}

impl StageResult {
    /// Validation report, for translate results
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match &self.report {
            StageReport::Validation(report) => Some(report),
            StageReport::Alignment(_) => None,
        }
    }

    /// Alignment report, for align results
    pub fn alignment_report(&self) -> Option<&AlignmentReport> {
        match &self.report {
            StageReport::Alignment(report) => Some(report),
            StageReport::Validation(_) => None,
        }
    }
}
