//! Retry classification and backoff for chain submissions.

use std::time::Duration;

use rand::Rng;

/// Submission failures that are safe to resubmit after a nonce reset.
const RETRYABLE_TX_ERRORS: [&str; 3] = [
    "nonce too low",
    "replacement transaction underpriced",
    "eof",
];

/// Whether a failed transaction submission should be rebuilt and resent.
pub fn is_retryable_tx_error(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_TX_ERRORS
        .iter()
        .any(|pattern| message.contains(pattern))
}

/// Exponential backoff: `base · 2^attempt` plus uniform jitter in `[0, base)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Disables retries entirely.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * 2u32.saturating_pow(attempt);
        let jitter_ms = rand::thread_rng().gen_range(0..=self.base_delay.as_millis() as u64);
        backoff + Duration::from_millis(jitter_ms)
    }
}
