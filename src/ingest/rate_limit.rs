//! Spacing gate for upstream calls.
//!
//! Policy: at least `min_interval` between successive calls, plus an extra
//! `cooldown` on every `cooldown_every`-th call. Delays are plain suspension
//! points (`tokio::time::sleep`); the limiter never fails.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub min_interval: Duration,
    pub cooldown_every: u64,
    pub cooldown: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::from(RateLimitConfig::default())
    }
}

impl From<RateLimitConfig> for RateLimitPolicy {
    fn from(c: RateLimitConfig) -> Self {
        Self {
            min_interval: Duration::from_secs(c.min_interval_secs),
            cooldown_every: c.cooldown_every,
            cooldown: Duration::from_secs(c.cooldown_secs),
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    last_call: Option<Instant>,
    calls: u64,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            last_call: None,
            calls: 0,
        }
    }

    /// Number of calls admitted so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Count the next call and return how long it must wait at `now`.
    ///
    /// The caller is expected to stamp the call with [`RateLimiter::mark_issued`]
    /// once the wait is over.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        self.calls += 1;

        let mut wait = match self.last_call {
            Some(last) => self
                .policy
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        };

        let every = self.policy.cooldown_every;
        if every > 0 && self.calls % every == 0 {
            wait += self.policy.cooldown;
        }
        wait
    }

    pub fn mark_issued(&mut self, at: Instant) {
        self.last_call = Some(at);
    }

    /// Suspend until the next upstream call may be issued.
    pub async fn acquire(&mut self) {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(
                target: "ingest",
                wait_ms = wait.as_millis() as u64,
                call = self.calls,
                "rate limiter delaying upstream call"
            );
            tokio::time::sleep(wait).await;
        }
        self.mark_issued(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
