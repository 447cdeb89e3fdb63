use std::time::Duration;

/// Linear retry delays: `base * attempt`, bounded by a maximum attempt count.
pub struct BackoffStrategy {
    base_delay: Duration,
    attempt: u32,
    max_attempts: u32,
}

impl BackoffStrategy {
    pub fn linear(base: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay: base,
            attempt: 0,
            max_attempts,
        }
    }

    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        self.attempt += 1;
        Some(self.base_delay * self.attempt)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}
