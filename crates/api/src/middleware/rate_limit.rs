//! Fixed-window per-client rate limiter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::AppError;

/// Number of tracked keys above which expired windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `limit` requests per key in each `window`.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `key`.
    ///
    /// Returns `Err(retry_after_secs)` when the key has used up its window.
    pub async fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut windows = self.windows.lock().await;

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.limit {
            let remaining = self.window.saturating_sub(now.duration_since(entry.started));
            // Round up so clients never retry a moment too early.
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(secs.max(1));
        }

        entry.count += 1;
        Ok(())
    }

    /// Like [`check`](Self::check) but maps refusal to [`AppError::RateLimited`].
    pub async fn enforce(&self, key: &str) -> Result<(), AppError> {
        self.check(key)
            .await
            .map_err(|retry_after_secs| AppError::RateLimited { retry_after_secs })
    }
}
