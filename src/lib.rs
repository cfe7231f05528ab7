// textlens - Text analysis service with a fingerprint-guarded cache and rate limiting
// Author: kelexine (https://github.com/kelexine)

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod ratelimit;
pub mod server;
pub mod store;
pub mod utils;
