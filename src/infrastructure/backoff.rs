use std::time::Duration;

/// Bounded linear backoff for reconnects.
///
/// The n-th retry waits `base * n`. After `max_attempts` retries the backoff
/// is exhausted until [`reset`](Self::reset) is called on a successful connect.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts,
            attempts: 0,
        }
    }

    /// Counts one more attempt and returns its delay, or `None` once the cap is hit.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.base.saturating_mul(self.attempts))
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(crate::types::RECONNECT_BASE_DELAY),
            crate::types::MAX_RECONNECT_ATTEMPTS,
        )
    }
}
