/*!
 * Transformation provider interface.
 *
 * The provider is an opaque, fallible call: text plus instructions in, text
 * out. Its output may be truncated, paraphrased, duplicated or missing
 * entirely, which is what validation and alignment exist to detect.
 *
 * - `prompts`: Instruction templates for translation and alignment requests
 * - `mock`: Scriptable provider used by tests and benchmarks
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod mock;
pub mod prompts;

/// What a request asks the provider to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformTask {
    /// Transform one chunk of source text
    Translate,
    /// Propose sentence pairs for a source text and its transformation
    Align,
}

/// A single provider call
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// What is being asked
    pub task: TransformTask,
    /// The text to transform (the source text for alignment requests)
    pub text: String,
    /// The accepted transformation, for alignment requests
    pub counterpart: Option<String>,
    /// Rendered instructions
    pub instructions: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl TransformRequest {
    /// Create a translation request for a chunk
    pub fn translate(text: impl Into<String>, instructions: impl Into<String>, temperature: f32) -> Self {
        Self {
            task: TransformTask::Translate,
            text: text.into(),
            counterpart: None,
            instructions: instructions.into(),
            temperature,
        }
    }

    /// Create an alignment request for a source text and its transformation
    pub fn align(
        source: impl Into<String>,
        target: impl Into<String>,
        instructions: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            task: TransformTask::Align,
            text: source.into(),
            counterpart: Some(target.into()),
            instructions: instructions.into(),
            temperature,
        }
    }
}

/// The provider's answer to a request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformResponse {
    /// The returned text
    pub text: String,
    /// Prompt tokens, when the provider reports them
    pub prompt_tokens: Option<u64>,
    /// Completion tokens, when the provider reports them
    pub completion_tokens: Option<u64>,
}

/// Common trait for all transformation providers
///
/// Implementations must be shareable across workers; one provider instance
/// serves every chapter processed by a worker pool.
#[async_trait]
pub trait TransformProvider: Send + Sync + Debug {
    /// Perform one transformation call
    async fn transform(&self, request: TransformRequest) -> Result<TransformResponse, ProviderError>;

    /// Name used in log messages
    fn name(&self) -> &str {
        "provider"
    }
}
