/*!
 * Retry policy: how each attempt's parameters are chosen.
 *
 * Translation retries use smaller chunks and a lower temperature. Alignment
 * retries stop using the local aligner and ask the provider to propose pairs
 * at temperature zero.
 */

use serde::{Deserialize, Serialize};

use super::state::Stage;

/// Retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per (chapter, stage) before manual review
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Temperature of first attempts
    #[serde(default = "default_base_temperature")]
    pub base_temperature: f32,

    /// Temperature of translation retries
    #[serde(default = "default_retry_temperature")]
    pub retry_temperature: f32,

    /// Chunk size multiplier applied per translation retry
    #[serde(default = "default_chunk_shrink_factor")]
    pub chunk_shrink_factor: f64,

    /// Chunk size never shrinks below this
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_temperature() -> f32 {
    0.3
}

fn default_retry_temperature() -> f32 {
    0.1
}

fn default_chunk_shrink_factor() -> f64 {
    0.6
}

fn default_min_chunk_chars() -> usize {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_temperature: default_base_temperature(),
            retry_temperature: default_retry_temperature(),
            chunk_shrink_factor: default_chunk_shrink_factor(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

/// Parameters of one attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptParams {
    /// Chunk size limit for translation
    pub max_chunk_chars: usize,
    /// Provider temperature
    pub temperature: f32,
    /// Ask the provider to propose alignment pairs
    pub regenerate_alignment: bool,
}

/// Chooses attempt parameters from the attempt number
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    config: RetryConfig,
    max_chunk_chars: usize,
}

impl RetryPolicy {
    /// Create a policy for a base chunk size
    pub fn new(config: RetryConfig, max_chunk_chars: usize) -> Self {
        Self { config, max_chunk_chars }
    }

    /// Attempt cap
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// The retry settings
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Parameters for the 1-based `attempt` of `stage`
    pub fn params_for(&self, stage: Stage, attempt: u32) -> AttemptParams {
        let retry = attempt > 1;

        match stage {
            Stage::Translate => {
                let max_chunk_chars = if retry {
                    let factor = self.config.chunk_shrink_factor.powi(attempt as i32 - 1);
                    let shrunk = (self.max_chunk_chars as f64 * factor).round() as usize;
                    shrunk
                        .max(self.config.min_chunk_chars.min(self.max_chunk_chars))
                        .max(1)
                } else {
                    self.max_chunk_chars
                };

                AttemptParams {
                    max_chunk_chars,
                    temperature: if retry {
                        self.config.retry_temperature
                    } else {
                        self.config.base_temperature
                    },
                    regenerate_alignment: false,
                }
            }
            Stage::Align => AttemptParams {
                max_chunk_chars: self.max_chunk_chars,
                temperature: if retry { 0.0 } else { self.config.base_temperature },
                regenerate_alignment: retry,
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default(), crate::app_config::default_max_chunk_chars())
    }
}
