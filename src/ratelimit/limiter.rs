//! Core rate limiter implementation.

use std::time::Duration;

use chrono::TimeDelta;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::window::{Decision, FixedWindow};
use crate::error::Result;

/// The admission gate in front of a single shared resource.
///
/// This struct is thread-safe and can be shared across multiple tasks. The
/// window refresh, the consume and the quota snapshot happen under one lock,
/// so concurrent callers never both take the last unit of capacity and every
/// caller sees the state its own decision produced.
pub struct RateLimiter<C = SystemClock> {
    /// Window state guarded as a unit
    window: Mutex<FixedWindow>,
    /// Source of the current instant
    clock: C,
}

impl RateLimiter {
    /// Create a rate limiter driven by the system clock.
    pub fn new(limit: u64, interval: Duration) -> Result<Self> {
        Self::with_clock(limit, interval, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a rate limiter driven by `clock`.
    pub fn with_clock(limit: u64, interval: Duration, clock: C) -> Result<Self> {
        let window = FixedWindow::new(limit, interval)?;
        Ok(Self {
            window: Mutex::new(window),
            clock,
        })
    }

    /// Decide whether one request may proceed.
    ///
    /// Consumed capacity is never handed back, even if the caller abandons
    /// the request afterwards.
    pub fn check(&self) -> Decision {
        let now = self.clock.now();

        let (decision, refreshed) = {
            let mut window = self.window.lock();
            let previous_end = window.window_end();
            let decision = window.decide(now);
            (decision, window.window_end() != previous_end)
        };

        let quota = decision.quota;
        if refreshed {
            debug!(reset = quota.reset, limit = quota.limit, "Started new rate limit window");
        }

        trace!(
            outcome = ?decision.outcome,
            used = quota.used,
            remaining = quota.remaining,
            reset = quota.reset,
            "Checked rate limit"
        );

        if !decision.is_admitted() {
            debug!(
                limit = quota.limit,
                reset = quota.reset,
                "Rate limit exceeded"
            );
        }

        decision
    }

    /// Get the limit for this limiter.
    pub fn limit(&self) -> u64 {
        self.window.lock().limit()
    }

    /// Get the window length.
    pub fn interval(&self) -> TimeDelta {
        self.window.lock().interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{ManualClock, Outcome};
    use chrono::{DateTime, Utc};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 400_000_000).unwrap()
    }

    fn manual(limit: u64, interval: Duration) -> (RateLimiter<ManualClock>, ManualClock) {
        let clock = ManualClock::new(start());
        let limiter = RateLimiter::with_clock(limit, interval, clock.clone()).unwrap();
        (limiter, clock)
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60)).unwrap();
        assert_eq!(limiter.limit(), 5);
        assert_eq!(limiter.interval(), TimeDelta::seconds(60));
    }

    #[test]
    fn test_zero_interval_fails_at_construction() {
        assert!(RateLimiter::new(5, Duration::ZERO).is_err());
    }

    #[test]
    fn test_two_per_minute_scenario() {
        let (limiter, clock) = manual(2, Duration::from_secs(60));

        let first = limiter.check();
        assert_eq!(first.outcome, Outcome::Admitted);
        assert_eq!((first.quota.used, first.quota.remaining), (1, 1));

        clock.advance(TimeDelta::milliseconds(10));
        let second = limiter.check();
        assert_eq!(second.outcome, Outcome::Admitted);
        assert_eq!((second.quota.used, second.quota.remaining), (2, 0));

        clock.advance(TimeDelta::milliseconds(10));
        let third = limiter.check();
        assert_eq!(third.outcome, Outcome::Rejected);
        assert_eq!((third.quota.used, third.quota.remaining), (2, 0));
        assert_eq!(third.quota.reset, first.quota.reset);
    }

    #[test]
    fn test_reset_is_stable_across_rejections() {
        let (limiter, clock) = manual(1, Duration::from_secs(1));
        let first = limiter.check();
        assert!(first.is_admitted());

        for _ in 0..5 {
            clock.advance(TimeDelta::milliseconds(150));
            let rejected = limiter.check();
            assert!(!rejected.is_admitted());
            assert_eq!(rejected.quota.reset, first.quota.reset);
        }
    }

    #[test]
    fn test_reset_advances_by_interval_after_expiry() {
        let (limiter, clock) = manual(1, Duration::from_secs(1));
        let first = limiter.check();
        assert!(!limiter.check().is_admitted());

        clock.set(start() + TimeDelta::seconds(1));
        let next = limiter.check();
        assert!(next.is_admitted());
        assert_eq!(next.quota.reset, first.quota.reset + 1);
        assert_eq!(next.quota.used, 1);
    }

    #[test]
    fn test_headers_always_add_up() {
        let (limiter, clock) = manual(3, Duration::from_secs(5));
        for _ in 0..20 {
            let quota = limiter.check().quota;
            assert_eq!(quota.used + quota.remaining, quota.limit);
            clock.advance(TimeDelta::milliseconds(700));
        }
    }

    #[test]
    fn test_concurrent_checks_admit_exactly_limit() {
        for limit in [0_u64, 1, 7, 64] {
            let limiter = Arc::new(RateLimiter::new(limit, Duration::from_secs(60)).unwrap());
            let threads = 256;
            let barrier = Arc::new(Barrier::new(threads));

            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let limiter = Arc::clone(&limiter);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        limiter.check()
                    })
                })
                .collect();

            let decisions: Vec<Decision> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();

            let admitted = decisions.iter().filter(|d| d.is_admitted()).count() as u64;
            assert_eq!(admitted, limit);

            // Each admitted caller saw its own position in the order.
            let mut used: Vec<u64> = decisions
                .iter()
                .filter(|d| d.is_admitted())
                .map(|d| d.quota.used)
                .collect();
            used.sort_unstable();
            assert_eq!(used, (1..=limit).collect::<Vec<_>>());

            assert!(decisions.iter().all(|d| d.quota.used <= limit));
        }
    }
}
