//! # Exponential Backoff
//!
//! Per-resource retry delays for reconciliations that end in a retriable
//! failure. Each failure doubles the delay, up to a cap; a successful
//! reconciliation resets it.
//!
//! ## Usage
//!
//! ```rust
//! use fleet_pipeline_controller::controller::backoff::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::new(1_000, 300_000);
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(4));
//! ```

use std::time::Duration;

/// Exponential backoff calculator (factor 2)
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// First delay in milliseconds (for reset)
    start_ms: u64,
    /// Delay returned by the next call in milliseconds
    current_ms: u64,
    /// Cap in milliseconds
    max_ms: u64,
}

impl ExponentialBackoff {
    /// Create a new backoff starting at `start_ms` and capped at `max_ms`
    ///
    /// A zero start is treated as one millisecond so the sequence still grows.
    #[must_use]
    pub fn new(start_ms: u64, max_ms: u64) -> Self {
        let start_ms = start_ms.max(1);
        let max_ms = max_ms.max(start_ms);
        Self {
            start_ms,
            current_ms: start_ms,
            max_ms,
        }
    }

    /// Get the next delay in milliseconds and advance the sequence
    ///
    /// ```
    /// use fleet_pipeline_controller::controller::backoff::ExponentialBackoff;
    ///
    /// let mut backoff = ExponentialBackoff::new(500, 1_500);
    /// assert_eq!(backoff.next_backoff_ms(), 500);
    /// assert_eq!(backoff.next_backoff_ms(), 1_000);
    /// assert_eq!(backoff.next_backoff_ms(), 1_500);
    /// assert_eq!(backoff.next_backoff_ms(), 1_500);
    /// ```
    pub fn next_backoff_ms(&mut self) -> u64 {
        let result = self.current_ms;
        self.current_ms = self.current_ms.saturating_mul(2).min(self.max_ms);
        result
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_millis(self.next_backoff_ms())
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.current_ms = self.start_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_sequence() {
        let mut backoff = ExponentialBackoff::new(1_000, 300_000);

        let expected = [1, 2, 4, 8, 16, 32, 64, 128, 256, 300, 300];
        for secs in expected {
            assert_eq!(backoff.next_backoff(), Duration::from_secs(secs));
        }
    }

    #[test]
    fn test_exponential_backoff_reset() {
        let mut backoff = ExponentialBackoff::new(1_000, 300_000);
        backoff.next_backoff_ms();
        backoff.next_backoff_ms();
        backoff.next_backoff_ms();

        backoff.reset();

        assert_eq!(backoff.next_backoff_ms(), 1_000);
        assert_eq!(backoff.next_backoff_ms(), 2_000);
    }

    #[test]
    fn test_degenerate_bounds() {
        let mut backoff = ExponentialBackoff::new(0, 0);
        assert_eq!(backoff.next_backoff_ms(), 1);
        assert_eq!(backoff.next_backoff_ms(), 1);

        let mut backoff = ExponentialBackoff::new(u64::MAX / 2 + 1, u64::MAX);
        backoff.next_backoff_ms();
        assert_eq!(backoff.next_backoff_ms(), u64::MAX);
    }
}
