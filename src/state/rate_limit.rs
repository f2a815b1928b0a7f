//! Fixed-window request counters keyed by caller address.

use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
    reset_wall: SystemTime,
}

/// Outcome of checking a caller against its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_at: SystemTime,
    },
    Limited {
        limit: u32,
        retry_after: Duration,
        reset_at: SystemTime,
    },
}

/// Process-local limiter; counters do not survive restarts and are not shared
/// across instances.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    entries: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            entries: DashMap::new(),
        }
    }

    /// Count a request from `key` against the current window.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now(), SystemTime::now())
    }

    pub(crate) fn check_at(&self, key: &str, now: Instant, wall: SystemTime) -> RateDecision {
        let mut entry = self.entries.entry(key.to_owned()).or_insert_with(|| Window {
            count: 0,
            reset_at: now + self.window,
            reset_wall: wall + self.window,
        });

        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + self.window;
            entry.reset_wall = wall + self.window;
        }

        if entry.count >= self.max_requests {
            return RateDecision::Limited {
                limit: self.max_requests,
                retry_after: entry.reset_at.saturating_duration_since(now),
                reset_at: entry.reset_wall,
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            limit: self.max_requests,
            remaining: self.max_requests - entry.count,
            reset_at: entry.reset_wall,
        }
    }

    /// Drop windows that have already expired.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub(crate) fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, window| window.reset_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of callers with a live window.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    /// Length of a counting window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_after_max_requests_within_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();
        let wall = SystemTime::now();

        assert!(matches!(
            limiter.check_at("1.2.3.4", now, wall),
            RateDecision::Allowed { remaining: 1, .. }
        ));
        assert!(matches!(
            limiter.check_at("1.2.3.4", now, wall),
            RateDecision::Allowed { remaining: 0, .. }
        ));
        match limiter.check_at("1.2.3.4", now + Duration::from_secs(10), wall) {
            RateDecision::Limited { retry_after, .. } => {
                assert_eq!(retry_after, Duration::from_secs(50))
            }
            other => panic!("expected limited, got {other:?}"),
        }

        // Other callers have their own window.
        assert!(matches!(
            limiter.check_at("5.6.7.8", now, wall),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        let wall = SystemTime::now();

        limiter.check_at("a", now, wall);
        assert!(matches!(
            limiter.check_at("a", now, wall),
            RateDecision::Limited { .. }
        ));
        assert!(matches!(
            limiter.check_at("a", now + Duration::from_secs(61), wall),
            RateDecision::Allowed { remaining: 0, .. }
        ));
    }

    #[test]
    fn purge_removes_only_expired_windows() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 10);
        let now = Instant::now();
        let wall = SystemTime::now();
        limiter.check_at("old", now, wall);
        limiter.check_at("fresh", now + Duration::from_secs(30), wall);

        assert_eq!(limiter.purge_expired_at(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.entries.len(), 1);
        assert!(limiter.entries.contains_key("fresh"));
    }
}
