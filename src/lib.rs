//! Tollgate - Fixed-Window Rate Limiting Middleware
//!
//! This crate caps the number of requests an HTTP handler processes within a
//! fixed time window and reports the limiter's state to clients through
//! `x-ratelimit-*` response headers, so they can throttle themselves.

pub mod config;
pub mod error;
pub mod probe;
pub mod ratelimit;
pub mod signal;
pub mod web;
