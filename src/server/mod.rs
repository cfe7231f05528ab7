//! Axum-based HTTP server for textlens.
//!
//! Exposes document CRUD and analysis over HTTP, with fixed-window rate
//! limiting in front of every route group.
//!
//! # Components
//!
//! - `handlers`: Endpoint implementations (texts, analysis, health, metrics).
//! - `middleware`: Rate limiting, client identity, request IDs and request metrics.
//! - `routes`: The router that wires handlers to their rate limit policies.
//!
//! Requests are attributed to a user through the `X-User-Id` header, set by
//! the authenticating proxy in front of this service.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::AuthenticatedUser;
pub use middleware::{client_ip, RateLimitGuard, USER_ID_HEADER};
pub use routes::{create_router, AppState};
