//! Retry and pacing policy for replayed mutations.
//!
//! Replays are strictly sequential and throttled: a fixed delay between
//! successive operations keeps the destination server from seeing concurrent
//! writes to an evolving tree, and each individual mutation gets a bounded
//! retry budget with no backoff beyond the round trip itself.

use anyhow::Result;
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Tunables for the replay layer, sourced from settings.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Attempts per individual mutation before the replay aborts.
    pub retry_budget: u32,
    /// Delay between successive distinct operations.
    pub call_delay: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            retry_budget: 10,
            call_delay: Duration::from_millis(400),
        }
    }
}

/// Bounded retry for one remote call. Exhausting the budget is terminal and
/// names the failed operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    budget: u32,
}

impl RetryPolicy {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            budget: config.retry_budget.max(1),
        }
    }

    pub async fn execute<F, Fut, T>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.budget => {
                    warn!(
                        "{} failed on attempt {}/{}, retrying: {:#}",
                        operation, attempt, self.budget, error
                    );
                    attempt += 1;
                }
                Err(error) => {
                    return Err(error.context(format!(
                        "{} failed after {} attempts",
                        operation, self.budget
                    )));
                }
            }
        }
    }
}

/// Sleeps the configured delay between operations, but not before the first.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    primed: bool,
}

impl Pacer {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            delay: config.call_delay,
            primed: false,
        }
    }

    pub async fn pace(&mut self) {
        if self.primed && !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.primed = true;
    }
}
