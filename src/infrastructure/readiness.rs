//! Readiness Polling
//!
//! Repeats a probe with exponential backoff until it succeeds or a deadline
//! passes. Used to wait for freshly started containers instead of sleeping
//! for a fixed amount of time.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Readiness polling configuration.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// Give up after this long
    pub timeout: Duration,
    /// Delay after the first failed probe
    pub initial_interval: Duration,
    /// Upper bound for the delay between probes
    pub max_interval: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
        }
    }
}

/// Doubling delay, capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
        }
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }
}

/// Outcome of a successful poll.
#[derive(Debug, Clone, Copy)]
pub struct ReadyAfter {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Outcome of a poll that ran out of time.
#[derive(Debug, Clone)]
pub struct NotReady {
    pub attempts: u32,
    pub last_error: String,
}

pub struct ReadinessPoller {
    config: ReadinessConfig,
}

impl ReadinessPoller {
    pub fn new(config: ReadinessConfig) -> Self {
        Self { config }
    }

    /// Probe until it returns Ok or the deadline passes.
    ///
    /// The probe always runs at least once. The last delay is shortened so
    /// that no sleep runs past the deadline.
    pub async fn poll<F, Fut>(&self, what: &str, mut probe: F) -> Result<ReadyAfter, NotReady>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let start = Instant::now();
        let deadline = start + self.config.timeout;
        let mut backoff = Backoff::new(self.config.initial_interval, self.config.max_interval);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match probe().await {
                Ok(()) => {
                    tracing::debug!("{} ready after {} attempt(s)", what, attempts);
                    return Ok(ReadyAfter {
                        attempts,
                        elapsed: start.elapsed(),
                    });
                }
                Err(error) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(NotReady {
                            attempts,
                            last_error: error,
                        });
                    }
                    let delay = backoff.next_delay().min(deadline - now);
                    tracing::warn!(
                        "{} not ready (attempt {}): {}; retrying in {:?}",
                        what,
                        attempts,
                        error,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
