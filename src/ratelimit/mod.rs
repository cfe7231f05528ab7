//! Fixed-window request admission.
//!
//! Policies are configuration; the limiter accepts any
//! `(purpose, max_requests, window_ms, identity mode)` combination.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod limiter;
mod policy;

pub use limiter::{Decision, RateLimiter, Window};
pub use policy::{Identity, IdentityMode, RateLimitPolicy};
