//! Protocol error accounting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Counts protocol errors over a sliding window.
///
/// A peer whose frames keep failing to decode is dropped once `limit`
/// errors fall within `window`.
#[derive(Debug)]
pub struct ErrorWindow {
    limit: usize,
    window: Duration,
    seen: VecDeque<Instant>,
}

impl ErrorWindow {
    /// Creates a window tripping after `limit` errors (at least one).
    pub fn new(limit: usize, window: Duration) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            window,
            seen: VecDeque::with_capacity(limit),
        }
    }

    /// Records an error at `now`. Returns true once `limit` errors fall
    /// within the window.
    pub fn record(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.seen.front() {
            if now.duration_since(oldest) > self.window {
                self.seen.pop_front();
            } else {
                break;
            }
        }
        self.seen.push_back(now);
        self.seen.len() >= self.limit
    }
}
