//! Per caller, per route request throttling.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::RateLimitConfig;

/// Expired windows are swept once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 10_000;

/// Result of counting a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Under the limit
    Allowed,
    /// Over the limit until the window closes
    Limited {
        /// Time until the current window ends
        retry_after: Duration,
    },
}

#[derive(Clone, Debug)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by caller and route.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests: config.requests,
            window: config.window,
        }
    }

    /// Counts a request from `caller` on `route`.
    pub fn check(&self, caller: &str, route: &str) -> Decision {
        self.check_at(caller, route, Instant::now())
    }

    fn check_at(&self, caller: &str, route: &str, now: Instant) -> Decision {
        let key = format!("{caller} {route}");
        let mut windows = self.windows.lock();

        if windows.len() >= PRUNE_THRESHOLD {
            let before = windows.len();
            let window = self.window;
            windows.retain(|_, entry| now.duration_since(entry.started) < window);
            debug!(
                removed = before - windows.len(),
                remaining = windows.len(),
                "rate limit windows pruned"
            );
        }

        let entry = windows.entry(key).or_insert(Window {
            count: 0,
            started: now,
        });
        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            return Decision::Limited {
                retry_after: self.window.saturating_sub(now.duration_since(entry.started)),
            };
        }
        entry.count += 1;
        Decision::Allowed
    }
}

/// Whole seconds to put in a `Retry-After` header, at least one.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}
