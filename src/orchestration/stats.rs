/*!
 * Per-run usage statistics.
 *
 * Every orchestrated run returns its own `UsageStats`; callers aggregate them
 * with `merge`. There is no process-wide tracker.
 */

use std::time::Duration;

/// Provider usage of one or more runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageStats {
    /// Provider calls made
    pub provider_calls: u64,
    /// Provider calls that returned an error
    pub provider_failures: u64,
    /// Characters sent to the provider
    pub chars_in: u64,
    /// Characters received from the provider
    pub chars_out: u64,
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
    /// Total number of tokens
    pub total_tokens: u64,
    /// Total time spent in provider calls
    pub api_duration: Duration,
    /// Attempts resolved
    pub attempts: u64,
    /// Attempts rejected by validation or alignment
    pub rejected_attempts: u64,
}

impl UsageStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful provider call
    pub fn record_call(
        &mut self,
        chars_in: usize,
        chars_out: usize,
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
        duration: Duration,
    ) {
        self.provider_calls += 1;
        self.chars_in += chars_in as u64;
        self.chars_out += chars_out as u64;
        self.api_duration += duration;
        self.add_token_usage(prompt_tokens, completion_tokens);
    }

    /// Record a failed provider call
    pub fn record_failure(&mut self, chars_in: usize, duration: Duration) {
        self.provider_calls += 1;
        self.provider_failures += 1;
        self.chars_in += chars_in as u64;
        self.api_duration += duration;
    }

    /// Add token usage numbers
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Add another run's stats to these
    pub fn merge(&mut self, other: &UsageStats) {
        self.provider_calls += other.provider_calls;
        self.provider_failures += other.provider_failures;
        self.chars_in += other.chars_in;
        self.chars_out += other.chars_out;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.api_duration += other.api_duration;
        self.attempts += other.attempts;
        self.rejected_attempts += other.rejected_attempts;
    }

    /// Calculate tokens per minute of API time
    pub fn tokens_per_minute(&self) -> f64 {
        let duration_minutes = self.api_duration.as_secs_f64() / 60.0;
        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of usage
    pub fn summary(&self) -> String {
        format!(
            "Usage Summary:\n\
             Provider calls: {} ({} failed)\n\
             Attempts: {} ({} rejected)\n\
             Characters: {} in, {} out\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider_calls,
            self.provider_failures,
            self.attempts,
            self.rejected_attempts,
            self.chars_in,
            self.chars_out,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}
