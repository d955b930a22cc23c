//! Sliding-window rate limiter for outbound sends.
//!
//! WhatsApp accounts get banned for bursty sending, so the worker pushes
//! every send through this limiter. The window is a timestamp list: a slot
//! is free once the oldest recorded send falls out of the window.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window counter: at most `max_per_window` sends per `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    sends: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            sends: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a send if a slot is free. Returns false when the window is
    /// full. Call this just before the actual send, so idle polling never
    /// burns slots.
    pub async fn try_acquire(&self) -> bool {
        let mut sends = self.sends.lock().await;
        let now = Instant::now();
        Self::prune(&mut sends, now, self.window);
        if sends.len() < self.max_per_window {
            sends.push_back(now);
            true
        } else {
            false
        }
    }

    /// Wait until at least one slot is free. Does not record a send.
    pub async fn wait_until_available(&self) {
        loop {
            let wait = {
                let mut sends = self.sends.lock().await;
                let now = Instant::now();
                Self::prune(&mut sends, now, self.window);
                if sends.len() < self.max_per_window {
                    return;
                }
                match sends.front() {
                    Some(oldest) => (*oldest + self.window).saturating_duration_since(now),
                    None => return,
                }
            };
            // Lock released before sleeping.
            tokio::time::sleep(wait.max(Duration::from_millis(10))).await;
        }
    }

    /// Number of sends currently counted in the window.
    pub async fn in_window(&self) -> usize {
        let mut sends = self.sends.lock().await;
        Self::prune(&mut sends, Instant::now(), self.window);
        sends.len()
    }

    fn prune(sends: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = sends.front() {
            if now.duration_since(*front) >= window {
                sends.pop_front();
            } else {
                break;
            }
        }
    }
}
