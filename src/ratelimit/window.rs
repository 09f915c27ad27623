//! Fixed-window capacity bookkeeping.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{Result, TollgateError};

/// Result of trying to take one unit of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Capacity was available and has been taken
    Admitted,
    /// The window is exhausted
    Rejected,
}

/// The limiter state a single decision was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Capacity of the window
    pub limit: u64,
    /// Capacity left after the decision
    pub remaining: u64,
    /// Capacity consumed after the decision
    pub used: u64,
    /// End of the window in whole seconds since the Unix epoch
    pub reset: i64,
}

/// An admit/reject outcome together with the quota it was decided against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub outcome: Outcome,
    pub quota: Quota,
}

impl Decision {
    /// Whether the request may proceed to the wrapped handler.
    pub fn is_admitted(&self) -> bool {
        self.outcome == Outcome::Admitted
    }
}

/// Capacity of a single shared resource over a fixed window.
///
/// The window starts at the first request observed after the previous one
/// expired, and lasts exactly `interval` from that request. Rejections never
/// move the window end.
///
/// This type is not synchronized; see [`RateLimiter`](super::RateLimiter).
#[derive(Debug, Clone)]
pub struct FixedWindow {
    /// Maximum admitted requests per window
    limit: u64,
    /// Length of each window
    interval: TimeDelta,
    /// Requests admitted in the current window
    consumed: u64,
    /// When the current window expires. `None` until the first request
    window_end: Option<DateTime<Utc>>,
}

impl FixedWindow {
    /// Create a window with full capacity that expires on first use.
    ///
    /// A `limit` of zero is allowed and rejects every request. A zero
    /// `interval` is refused.
    pub fn new(limit: u64, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(TollgateError::InvalidInterval(interval));
        }
        let interval =
            TimeDelta::from_std(interval).map_err(|_| TollgateError::InvalidInterval(interval))?;

        Ok(Self {
            limit,
            interval,
            consumed: 0,
            window_end: None,
        })
    }

    /// Start a fresh window at `now` if the current one has expired.
    ///
    /// A request landing exactly on the window end refreshes. Returns the end
    /// of the window `now` belongs to.
    pub fn refresh_if_expired(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.window_end {
            Some(end) if now < end => end,
            _ => {
                let end = now
                    .checked_add_signed(self.interval)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                self.consumed = 0;
                self.window_end = Some(end);
                end
            }
        }
    }

    /// Take one unit of capacity if any is left.
    ///
    /// Never moves `consumed` past `limit`.
    pub fn try_consume(&mut self) -> Outcome {
        if self.consumed >= self.limit {
            return Outcome::Rejected;
        }
        self.consumed += 1;
        Outcome::Admitted
    }

    /// Refresh, consume and snapshot the resulting quota in one step.
    pub fn decide(&mut self, now: DateTime<Utc>) -> Decision {
        let end = self.refresh_if_expired(now);
        let outcome = self.try_consume();

        Decision {
            outcome,
            quota: Quota {
                limit: self.limit,
                remaining: self.limit - self.consumed,
                used: self.consumed,
                reset: end.timestamp(),
            },
        }
    }

    /// Get the limit for this window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Get the window length.
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Requests admitted in the current window.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// End of the current window, if one has started.
    pub fn window_end(&self) -> Option<DateTime<Utc>> {
        self.window_end
    }
}
