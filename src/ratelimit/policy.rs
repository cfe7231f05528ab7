// Rate limit policies and client identities
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a policy identifies the client it counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Always the client address.
    Ip,
    /// The authenticated user, falling back to the client address.
    User,
}

/// The subject a counter belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    User(String),
    Ip(String),
}

impl Identity {
    /// Pick the identity for `mode` from what the request carries.
    pub fn resolve(mode: IdentityMode, user_id: Option<&str>, client_ip: &str) -> Self {
        match (mode, user_id) {
            (IdentityMode::User, Some(user)) if !user.is_empty() => Identity::User(user.to_string()),
            _ => Identity::Ip(client_ip.to_string()),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => write!(f, "user:{}", id),
            Identity::Ip(addr) => write!(f, "ip:{}", addr),
        }
    }
}

/// One quota: at most `max_requests` per `window_ms` per identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Counter namespace, e.g. `general` or `analysis`.
    pub purpose: String,
    pub max_requests: u64,
    pub window_ms: u64,
    pub identity: IdentityMode,
    /// Body message for rejected requests.
    pub message: String,
}

impl RateLimitPolicy {
    pub fn new(purpose: impl Into<String>, max_requests: u64, window_ms: u64, identity: IdentityMode) -> Self {
        Self {
            purpose: purpose.into(),
            max_requests,
            window_ms,
            identity,
            message: "Too many requests, please try again later.".to_string(),
        }
    }
}
