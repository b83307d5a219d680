/*!
 * Integrity validation service.
 *
 * This module combines the volume and structure checks into a single
 * `ValidationReport` for a source/transformed pair. Reports are plain data:
 * they never modify the text, they only tell the retry orchestrator whether
 * the output can be accepted.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::length::{LengthValidator, LengthValidatorConfig};
use super::structure::{LineMode, StructureValidator, StructureValidatorConfig};

/// Thresholds for integrity validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Length ratio below which output is critical
    #[serde(default = "default_critical_length_ratio")]
    pub critical_length_ratio: f64,

    /// Length ratio below which output is warned
    #[serde(default = "default_warning_length_ratio")]
    pub warning_length_ratio: f64,

    /// Paragraph ratio below which structure is lost
    #[serde(default = "default_critical_paragraph_ratio")]
    pub critical_paragraph_ratio: f64,

    /// Single/double break factor that marks a line-oriented source
    #[serde(default = "default_single_newline_factor")]
    pub single_newline_factor: f64,

    /// Blank-line breaks a line-oriented source needs before it is recounted
    #[serde(default = "default_single_newline_min_breaks")]
    pub single_newline_min_breaks: usize,

    /// Output paragraphs above which the recount may be skipped
    #[serde(default = "default_soft_pass_min_paragraphs")]
    pub soft_pass_min_paragraphs: usize,

    /// Length ratio above which the recount may be skipped
    #[serde(default = "default_soft_pass_min_length_ratio")]
    pub soft_pass_min_length_ratio: f64,

    /// Length ratio above which the paragraph ratio may be forced to 1.0
    #[serde(default = "default_override_min_length_ratio")]
    pub override_min_length_ratio: f64,

    /// Whether each chunk output is validated before the next provider call
    #[serde(default = "default_true")]
    pub validate_chunks: bool,
}

fn default_critical_length_ratio() -> f64 {
    super::length::DEFAULT_CRITICAL_LENGTH_RATIO
}

fn default_warning_length_ratio() -> f64 {
    super::length::DEFAULT_WARNING_LENGTH_RATIO
}

fn default_critical_paragraph_ratio() -> f64 {
    0.6
}

fn default_single_newline_factor() -> f64 {
    1.8
}

fn default_single_newline_min_breaks() -> usize {
    10
}

fn default_soft_pass_min_paragraphs() -> usize {
    20
}

fn default_soft_pass_min_length_ratio() -> f64 {
    0.7
}

fn default_override_min_length_ratio() -> f64 {
    0.65
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            critical_length_ratio: default_critical_length_ratio(),
            warning_length_ratio: default_warning_length_ratio(),
            critical_paragraph_ratio: default_critical_paragraph_ratio(),
            single_newline_factor: default_single_newline_factor(),
            single_newline_min_breaks: default_single_newline_min_breaks(),
            soft_pass_min_paragraphs: default_soft_pass_min_paragraphs(),
            soft_pass_min_length_ratio: default_soft_pass_min_length_ratio(),
            override_min_length_ratio: default_override_min_length_ratio(),
            validate_chunks: true,
        }
    }
}

/// Three-way classification of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No issues
    Valid,
    /// Advisory warnings only; acceptable
    Warned,
    /// At least one critical issue; must not be accepted
    Critical,
}

/// Outcome of validating one transformed text against its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Transformed / source character ratio
    pub length_ratio: f64,
    /// Transformed / source paragraph ratio, after heuristics
    pub paragraph_ratio: f64,
    /// Source paragraph count used for the ratio
    pub original_paragraph_count: usize,
    /// Transformed paragraph count used for the ratio
    pub transformed_paragraph_count: usize,
    /// Source length in characters
    pub original_chars: usize,
    /// Transformed length in characters
    pub transformed_chars: usize,
    /// Line-mode heuristic outcome
    pub line_mode: LineMode,
    /// Issues that block acceptance
    pub critical_issues: Vec<String>,
    /// Advisory issues
    pub warnings: Vec<String>,
    /// True when there are no critical issues
    pub valid: bool,
}

impl ValidationReport {
    /// Classify the report
    pub fn verdict(&self) -> Verdict {
        if !self.critical_issues.is_empty() {
            Verdict::Critical
        } else if !self.warnings.is_empty() {
            Verdict::Warned
        } else {
            Verdict::Valid
        }
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{:?}: length ratio {:.3} ({} -> {} chars), paragraph ratio {:.3} ({} -> {}), {} critical, {} warnings",
            self.verdict(),
            self.length_ratio,
            self.original_chars,
            self.transformed_chars,
            self.paragraph_ratio,
            self.original_paragraph_count,
            self.transformed_paragraph_count,
            self.critical_issues.len(),
            self.warnings.len()
        )
    }
}

/// Validates that transformed text conserves the volume and structure of its source
#[derive(Debug, Clone)]
pub struct IntegrityValidator {
    config: ValidationConfig,
    length_validator: LengthValidator,
    structure_validator: StructureValidator,
}

impl IntegrityValidator {
    /// Create a new validator with default thresholds
    pub fn new() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    /// Create a new validator with custom thresholds
    pub fn with_config(config: ValidationConfig) -> Self {
        let length_config = LengthValidatorConfig {
            critical_ratio: config.critical_length_ratio,
            warning_ratio: config.warning_length_ratio,
        };

        let structure_config = StructureValidatorConfig {
            critical_ratio: config.critical_paragraph_ratio,
            single_newline_factor: config.single_newline_factor,
            recount_min_breaks: config.single_newline_min_breaks,
            soft_pass_min_paragraphs: config.soft_pass_min_paragraphs,
            soft_pass_min_length_ratio: config.soft_pass_min_length_ratio,
            override_min_length_ratio: config.override_min_length_ratio,
            ..Default::default()
        };

        Self {
            config,
            length_validator: LengthValidator::with_config(length_config),
            structure_validator: StructureValidator::with_config(structure_config),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a transformed text against its source
    pub fn validate(&self, original: &str, transformed: &str) -> ValidationReport {
        let mut critical_issues = Vec::new();
        let mut warnings = Vec::new();

        if original.trim().is_empty() {
            critical_issues.push("source text is empty".to_string());
        }

        let length = self.length_validator.check(original, transformed);
        if let Some(issue) = &length.issue {
            if issue.is_critical() {
                critical_issues.push(issue.to_string());
            } else {
                warnings.push(issue.to_string());
            }
        }

        let structure = self
            .structure_validator
            .check(original, transformed, length.ratio);
        if let Some(issue) = &structure.issue {
            critical_issues.push(issue.to_string());
        }

        let report = ValidationReport {
            length_ratio: length.ratio,
            paragraph_ratio: structure.paragraph_ratio,
            original_paragraph_count: structure.original_paragraphs,
            transformed_paragraph_count: structure.transformed_paragraphs,
            original_chars: length.source_len,
            transformed_chars: length.transformed_len,
            line_mode: structure.line_mode,
            valid: critical_issues.is_empty(),
            critical_issues,
            warnings,
        };

        debug!("Validation complete: {}", report.summary());

        report
    }
}

impl Default for IntegrityValidator {
    fn default() -> Self {
        Self::new()
    }
}
