//! Utility functions and helpers for textlens.
//!
//! This module provides cross-cutting concerns like structured logging,
//! credential redaction, and retry logic with backoff.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and URL redaction.
//! - `retry`: Backoff-driven retries for store connection setup.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
