//! # Rate Limiter
//!
//! Client-side request pacing for Fleet Management (N requests per second,
//! burst of one).
//!
//! Waiting holds no resources beyond the future itself, so dropping the
//! future (e.g. when the reconcile's cancellation token fires) abandons the
//! wait without consuming a slot.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until the next request slot is available and claim it
    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(at) if at > now => at,
            _ => now,
        };
        tokio::time::sleep_until(slot).await;
        *next_slot = Some(slot + self.interval);
    }
}
