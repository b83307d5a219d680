use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::alignment::AlignmentConfig;
use crate::orchestration::policy::{RetryConfig, RetryPolicy};
use crate::validation::ValidationConfig;

/// Application configuration module
/// This module handles loading, validating and saving the configuration.
/// A `Config` is an immutable value: the `with_*` methods return an updated copy.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Chunking settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Integrity validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Alignment thresholds and weights
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Worker pool settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// SQLite database path; the platform data directory is used when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Chunking settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Maximum characters per provider call on first attempts
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

/// Worker pool settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Chapters processed concurrently
    #[serde(default = "default_concurrent_chapters")]
    pub concurrent_chapters: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrent_chapters: default_concurrent_chapters(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

/// Default chunk size limit in characters
pub fn default_max_chunk_chars() -> usize {
    4000
}

fn default_concurrent_chapters() -> usize {
    4
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json).with_context(|| format!("Failed to write config to file: {:?}", path))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if self.segmentation.max_chunk_chars == 0 {
            return Err(anyhow!("segmentation.max_chunk_chars must be greater than zero"));
        }

        let validation = &self.validation;
        for (name, value) in [
            ("validation.critical_length_ratio", validation.critical_length_ratio),
            ("validation.warning_length_ratio", validation.warning_length_ratio),
            ("validation.critical_paragraph_ratio", validation.critical_paragraph_ratio),
            ("validation.soft_pass_min_length_ratio", validation.soft_pass_min_length_ratio),
            ("validation.override_min_length_ratio", validation.override_min_length_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be between 0 and 1, got {}", name, value));
            }
        }
        if validation.warning_length_ratio < validation.critical_length_ratio {
            return Err(anyhow!(
                "validation.warning_length_ratio ({}) is below validation.critical_length_ratio ({})",
                validation.warning_length_ratio,
                validation.critical_length_ratio
            ));
        }
        if validation.single_newline_factor <= 0.0 {
            return Err(anyhow!("validation.single_newline_factor must be positive"));
        }

        let alignment = &self.alignment;
        for (name, value) in [
            ("alignment.confidence_floor", alignment.confidence_floor),
            ("alignment.coverage_floor", alignment.coverage_floor),
            ("alignment.quality_floor", alignment.quality_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be between 0 and 1, got {}", name, value));
            }
        }
        let weights = [
            alignment.coverage_weight,
            alignment.confidence_weight,
            alignment.misalignment_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(anyhow!("alignment weights must be non-negative with a positive sum"));
        }
        if alignment.misalignment_penalty < 0.0 {
            return Err(anyhow!("alignment.misalignment_penalty must not be negative"));
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
        if !(self.retry.chunk_shrink_factor > 0.0 && self.retry.chunk_shrink_factor <= 1.0) {
            return Err(anyhow!(
                "retry.chunk_shrink_factor must be in (0, 1], got {}",
                self.retry.chunk_shrink_factor
            ));
        }

        if self.worker.concurrent_chapters == 0 {
            return Err(anyhow!("worker.concurrent_chapters must be at least 1"));
        }

        Ok(())
    }

    /// Retry policy derived from the retry and segmentation settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.clone(), self.segmentation.max_chunk_chars)
    }

    /// Copy with other languages
    pub fn with_languages(mut self, source_language: &str, target_language: &str) -> Self {
        self.source_language = source_language.to_string();
        self.target_language = target_language.to_string();
        self
    }

    /// Copy with another chunk size limit
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.segmentation.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Copy with other validation thresholds
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Copy with other alignment thresholds
    pub fn with_alignment(mut self, alignment: AlignmentConfig) -> Self {
        self.alignment = alignment;
        self
    }

    /// Copy with another retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Copy with another worker concurrency
    pub fn with_concurrent_chapters(mut self, concurrent_chapters: usize) -> Self {
        self.worker.concurrent_chapters = concurrent_chapters;
        self
    }

    /// Copy with a database path
    pub fn with_database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Copy with another log level
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            segmentation: SegmentationConfig::default(),
            validation: ValidationConfig::default(),
            alignment: AlignmentConfig::default(),
            retry: RetryConfig::default(),
            worker: WorkerConfig::default(),
            database_path: None,
            log_level: LogLevel::default(),
        }
    }
}
