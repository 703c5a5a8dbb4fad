//! # Exponential Backoff
//!
//! Delay between convergence checks. The n-th delay (0-indexed) is
//! `initial * factor^n`, with no jitter and no cap: the number of attempts
//! bounds the total wait, not the individual delay.

use std::time::Duration;

/// Exponential backoff calculator
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Delay before the second attempt
    initial: Duration,
    /// Multiplier applied per attempt
    factor: f64,
    /// Number of delays handed out so far
    attempt: u32,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff
    ///
    /// # Arguments
    ///
    /// * `initial` - First delay (typically 1s)
    /// * `factor` - Growth factor per attempt (typically 2.0)
    #[must_use]
    pub fn new(initial: Duration, factor: f64) -> Self {
        Self {
            initial,
            factor,
            attempt: 0,
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Self::calculate_for_attempt(self.attempt, self.initial, self.factor);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Calculate the delay that follows attempt `attempt` (stateless)
    ///
    /// Saturates at `Duration::MAX` instead of overflowing. A negative or
    /// NaN factor yields no delay.
    #[must_use]
    pub fn calculate_for_attempt(attempt: u32, initial: Duration, factor: f64) -> Duration {
        if factor.is_nan() || factor < 0.0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let seconds = initial.as_secs_f64() * factor.powi(exponent);
        // 0 * inf
        if seconds.is_nan() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}
