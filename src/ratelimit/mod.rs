//! Rate limiting logic and state management.

mod clock;
mod headers;
mod limiter;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use headers::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET, X_RATELIMIT_USED};
pub use limiter::RateLimiter;
pub use window::{Decision, FixedWindow, Outcome, Quota};
