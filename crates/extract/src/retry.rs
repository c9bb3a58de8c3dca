use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed for one completion, counting the first.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 5000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
        }
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn start(&self) -> Backoff {
        Backoff {
            max_retries: self.max_retries,
            retries: 0,
            delay: self.initial_backoff(),
            state: RetryState::Attempting,
        }
    }
}

/// What a single attempt produced, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    RateLimited,
    Incomplete,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting,
    /// Wait this long, then attempt again.
    BackoffRateLimited(Duration),
    BackoffIncomplete(Duration),
    Exhausted,
    Succeeded,
}

/// Retry bookkeeping for one completion. Only 429s grow the delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    max_retries: u32,
    retries: u32,
    delay: Duration,
    state: RetryState,
}

impl Backoff {
    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Record the outcome of the attempt just made and move to the next state.
    pub fn observe(&mut self, outcome: AttemptOutcome) -> RetryState {
        let (state, retries, delay) = transition(self.max_retries, self.retries, self.delay, outcome);
        self.state = state;
        self.retries = retries;
        self.delay = delay;
        state
    }
}

/// Pure transition: (retries so far, current delay, outcome) to the next
/// state plus the updated counters.
pub fn transition(
    max_retries: u32,
    retries: u32,
    delay: Duration,
    outcome: AttemptOutcome,
) -> (RetryState, u32, Duration) {
    let next = retries + 1;
    match outcome {
        AttemptOutcome::Complete => (RetryState::Succeeded, retries, delay),
        _ if next >= max_retries => (RetryState::Exhausted, next, delay),
        AttemptOutcome::RateLimited => (RetryState::BackoffRateLimited(delay), next, delay.saturating_mul(2)),
        AttemptOutcome::Incomplete => (RetryState::BackoffIncomplete(delay), next, delay),
    }
}

/// Suspension capability, injected so back-off can be tested without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
