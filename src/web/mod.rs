//! HTTP middleware and server for the rate limited endpoint.

mod layer;
mod server;

pub use layer::{RateLimit, RateLimitLayer};
pub use server::{router, HttpServer};
