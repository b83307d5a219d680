/*!
 * Fixture providers and response transforms for integration tests
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use chapterguard::errors::ProviderError;
use chapterguard::providers::mock::MockProvider;
use chapterguard::providers::{TransformProvider, TransformRequest, TransformResponse};

/// Uppercase "translation": same volume and structure as the source
pub fn shout(request: &TransformRequest) -> String {
    request.text.to_uppercase()
}

/// Joins every paragraph into one, keeping the volume
pub fn merge_paragraphs(request: &TransformRequest) -> String {
    request
        .text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A mock provider that translates by uppercasing
pub fn shouting_provider() -> MockProvider {
    MockProvider::working().with_custom_response(shout)
}

/// Truncates the first `bad_calls` translate responses to a quarter, then echoes
#[derive(Debug)]
pub struct RecoveringProvider {
    bad_calls: usize,
    calls: AtomicUsize,
}

impl RecoveringProvider {
    pub fn new(bad_calls: usize) -> Self {
        Self {
            bad_calls,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransformProvider for RecoveringProvider {
    async fn transform(&self, request: TransformRequest) -> Result<TransformResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let text = if call < self.bad_calls {
            request.text.chars().take(request.text.chars().count() / 4).collect()
        } else {
            request.text.clone()
        };

        Ok(TransformResponse {
            text,
            prompt_tokens: Some(10),
            completion_tokens: Some(10),
        })
    }

    fn name(&self) -> &str {
        "recovering"
    }
}
