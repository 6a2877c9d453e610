use std::time::Duration;
use tokio::time::Instant;

/// Cooperative timeout for waits that are split into bounded slices.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    /// Longest wait allowed right now, capped at `max`
    pub fn slice(&self, max: Duration) -> Duration {
        self.remaining().min(max)
    }
}
