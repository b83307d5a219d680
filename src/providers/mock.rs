/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates the failure modes
 * integrity checks must catch:
 * - `MockProvider::working()` - Returns the text unchanged (or a custom transform)
 * - `MockProvider::truncated()` - Drops the second half of the text
 * - `MockProvider::duplicated()` - Repeats the text
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::scripted(..)` - Replays a fixed list of outcomes
 *
 * Alignment requests are answered with a JSON array that pairs sentences of
 * the two texts in order.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::alignment::ProposedPair;
use crate::errors::ProviderError;
use crate::segmentation::SentenceSplitter;

use super::{TransformProvider, TransformRequest, TransformResponse, TransformTask};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a faithful transformation
    Working,
    /// Returns only the first half of the text
    Truncated,
    /// Returns the text twice
    Duplicated,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
    /// Simulates a slow response
    Slow { delay_ms: u64 },
    /// Replays the scripted outcomes, then behaves as `Working`
    Scripted,
}

/// Scripted outcome of one request
pub type ScriptedOutcome = Result<String, ProviderError>;

/// Mock provider for testing integrity behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<TransformRequest>>>,
    /// Outcomes replayed by `Scripted`
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    /// Custom transform for successful translate requests (optional)
    custom_response: Option<fn(&TransformRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that drops the second half of every text
    pub fn truncated() -> Self {
        Self::new(MockBehavior::Truncated)
    }

    /// Create a mock that repeats every text
    pub fn duplicated() -> Self {
        Self::new(MockBehavior::Duplicated)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that delays every response
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock that replays `outcomes` in order, then works normally
    pub fn scripted(outcomes: Vec<ScriptedOutcome>) -> Self {
        let provider = Self::new(MockBehavior::Scripted);
        provider.script.lock().extend(outcomes);
        provider
    }

    /// Set a custom transform for successful translate requests
    pub fn with_custom_response(mut self, generator: fn(&TransformRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<TransformRequest> {
        self.requests.lock().clone()
    }

    /// Build a JSON alignment answer pairing the sentences of two texts in order
    pub fn generate_alignment_response(source: &str, target: &str) -> String {
        let splitter = SentenceSplitter::default();
        let pairs: Vec<ProposedPair> = splitter
            .split(source)
            .into_iter()
            .zip(splitter.split(target))
            .map(|(s, t)| ProposedPair {
                source: s.to_string(),
                target: t.to_string(),
            })
            .collect();
        serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
    }

    /// A successful answer to a request
    fn faithful(&self, request: &TransformRequest) -> String {
        match request.task {
            TransformTask::Translate => match self.custom_response {
                Some(generator) => generator(request),
                None => request.text.clone(),
            },
            TransformTask::Align => Self::generate_alignment_response(
                &request.text,
                request.counterpart.as_deref().unwrap_or_default(),
            ),
        }
    }

    fn respond(request: &TransformRequest, text: String) -> TransformResponse {
        TransformResponse {
            prompt_tokens: Some((request.instructions.len() + request.text.len()) as u64 / 4),
            completion_tokens: Some(text.len() as u64 / 4),
            text,
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            script: Arc::clone(&self.script),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl TransformProvider for MockProvider {
    async fn transform(&self, request: TransformRequest) -> Result<TransformResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => {
                let text = self.faithful(&request);
                Ok(Self::respond(&request, text))
            }

            MockBehavior::Truncated => {
                let text = self.faithful(&request);
                let half: String = text.chars().take(text.chars().count() / 2).collect();
                Ok(Self::respond(&request, half))
            }

            MockBehavior::Duplicated => {
                let text = self.faithful(&request);
                Ok(Self::respond(&request, format!("{}{}", text, text)))
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    let text = self.faithful(&request);
                    Ok(Self::respond(&request, text))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(Self::respond(&request, String::new())),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                let text = self.faithful(&request);
                Ok(Self::respond(&request, text))
            }

            MockBehavior::Scripted => {
                let next = self.script.lock().pop_front();
                match next {
                    Some(Ok(text)) => Ok(Self::respond(&request, text)),
                    Some(Err(error)) => Err(error),
                    None => {
                        let text = self.faithful(&request);
                        Ok(Self::respond(&request, text))
                    }
                }
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
