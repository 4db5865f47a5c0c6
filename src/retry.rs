// 🔁 Retry - backoff policy, write paths and observers for resilient creates
//
// The store never decides on its own whether a backend write fails. Every
// attempt goes through a WritePath: production code uses DirectWrite, and
// SucceedOnAttempt simulates a flaky backend that only accepts the write on
// one specific attempt.

use std::time::Duration;

use rand::Rng;
use tracing::{error, info};

use crate::error::TransientWriteError;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Bounded exponential backoff.
///
/// The delay after failed attempt `n` (1-based) is
/// `min(initial_delay * multiplier^(n-1), max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// Whether another attempt may follow the given (1-based) attempt.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let seconds = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = seconds.min(self.max_delay.as_secs_f64());

        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }
}

impl Default for RetryPolicy {
    /// Default: 3 attempts, 1s initial delay doubling up to 10s.
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Write paths
// ---------------------------------------------------------------------------

pub const WRITE_FAILED: &str = "Database write operation failed.";

/// The backend write performed once per attempt before the store commits.
pub trait WritePath: Send + Sync {
    fn attempt(&self, attempt: u32) -> Result<(), TransientWriteError>;
}

/// A backend that always accepts the write.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWrite;

impl WritePath for DirectWrite {
    fn attempt(&self, _attempt: u32) -> Result<(), TransientWriteError> {
        Ok(())
    }
}

/// A simulated flaky backend that only accepts the write on one attempt.
///
/// With a threshold of 0, or one above the policy's attempt budget, every
/// attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SucceedOnAttempt(pub u32);

impl SucceedOnAttempt {
    /// Pick the succeeding attempt uniformly from `0..upper`.
    pub fn random(upper: u32) -> Self {
        if upper == 0 {
            return SucceedOnAttempt(0);
        }
        SucceedOnAttempt(rand::thread_rng().gen_range(0..upper))
    }
}

impl WritePath for SucceedOnAttempt {
    fn attempt(&self, attempt: u32) -> Result<(), TransientWriteError> {
        if attempt == self.0 {
            Ok(())
        } else {
            Err(TransientWriteError::new(attempt, WRITE_FAILED))
        }
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Side channel for retry progress. Every hook defaults to doing nothing.
pub trait RetryObserver: Send + Sync {
    fn attempt_failed(&self, _attempt: u32, _error: &TransientWriteError) {}

    fn backing_off(&self, _attempt: u32, _delay: Duration) {}

    fn succeeded(&self, _attempt: u32) {}

    fn rejected_duplicate(&self, _attempt: u32, _id: &str) {}

    fn exhausted(&self, _attempts: u32) {}
}

/// Reports retry progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn attempt_failed(&self, attempt: u32, error: &TransientWriteError) {
        info!("Error creating entity on attempt {}: {}", attempt, error);
    }

    fn backing_off(&self, _attempt: u32, delay: Duration) {
        info!("Retrying in {} seconds...", delay.as_secs_f64());
    }

    fn succeeded(&self, attempt: u32) {
        info!("Entity created successfully on attempt {}", attempt);
    }

    fn rejected_duplicate(&self, attempt: u32, id: &str) {
        info!("Entity {} already exists (attempt {})", id, attempt);
    }

    fn exhausted(&self, _attempts: u32) {
        error!("Maximum retry attempts reached. Failed to create entity.");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
