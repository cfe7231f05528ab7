//! Configuration data structures for textlens.
//!
//! This module defines the schema for the application settings: the HTTP
//! server, the shared key-value store, the derived cache, the rate-limit
//! policy table, and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::ratelimit::{IdentityMode, RateLimitPolicy};
use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, body limit).
    #[serde(default)]
    pub server: ServerConfig,

    /// Shared key-value store connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Derived analysis cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Per-purpose request quotas.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `3000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body in bytes.
    /// Default: `1048576` (1 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Enable only behind a proxy that overwrites these headers.
    /// Default: `false`
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// Which [`crate::store::KeyValueStore`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// Settings for the shared key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store implementation.
    /// Default: `redis`
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Connection URL for the Redis backend.
    /// Default: `redis://localhost:6379`
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Per-call timeout in milliseconds. A timed-out call counts as unreachable.
    /// Default: `500`
    #[serde(default = "default_store_timeout")]
    pub timeout_ms: u64,

    /// Connection attempts at startup before giving up.
    /// Default: `5`
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

/// Settings for the derived analysis cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false every lookup is a miss and nothing is written.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TTL for analysis, fingerprint and field entries.
    /// Default: `3600`
    #[serde(default = "default_cache_ttl")]
    pub analysis_ttl_seconds: u64,

    /// TTL for cached per-user document lists.
    /// Default: `3600`
    #[serde(default = "default_cache_ttl")]
    pub user_documents_ttl_seconds: u64,
}

/// One policy row as it appears in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub window_ms: u64,
    pub max_requests: u64,
    pub identity: IdentityMode,
}

/// The rate-limit policy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// When false every request is admitted without touching the store.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// All API routes. Default: 100 per 15 minutes, per IP.
    #[serde(default = "default_general_policy")]
    pub general: PolicyConfig,

    /// Login attempts. Default: 5 per 15 minutes, per IP.
    #[serde(default = "default_auth_policy")]
    pub auth: PolicyConfig,

    /// Account creation. Default: 3 per hour, per IP.
    #[serde(default = "default_registration_policy")]
    pub registration: PolicyConfig,

    /// Analysis endpoints. Default: 10 per 5 minutes, per user.
    #[serde(default = "default_analysis_policy")]
    pub analysis: PolicyConfig,

    /// Create, update and delete. Default: 20 per 10 minutes, per user.
    #[serde(default = "default_text_modification_policy")]
    pub text_modification: PolicyConfig,

    /// Health check endpoint. Default: 30 per minute, per IP.
    #[serde(default = "default_health_check_policy")]
    pub health_check: PolicyConfig,
}

impl RateLimitConfig {
    /// Resolve a policy by purpose name.
    pub fn policy(&self, purpose: &str) -> Option<RateLimitPolicy> {
        let (row, message) = match purpose {
            "general" => (&self.general, "Too many requests from this IP, please try again later."),
            "auth" => (
                &self.auth,
                "Too many authentication attempts from this IP, please try again later.",
            ),
            "registration" => (
                &self.registration,
                "Too many registration attempts from this IP, please try again later.",
            ),
            "analysis" => (&self.analysis, "Too many analysis requests, please try again later."),
            "text_modification" => (
                &self.text_modification,
                "Too many text modification requests, please try again later.",
            ),
            "health_check" => (&self.health_check, "Too many health check requests."),
            _ => return None,
        };

        Some(RateLimitPolicy {
            purpose: purpose.to_string(),
            max_requests: row.max_requests,
            window_ms: row.window_ms,
            identity: row.identity,
            message: message.to_string(),
        })
    }
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            trust_proxy_headers: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_store_url(),
            timeout_ms: default_store_timeout(),
            connect_retries: default_connect_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            analysis_ttl_seconds: default_cache_ttl(),
            user_documents_ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general: default_general_policy(),
            auth: default_auth_policy(),
            registration: default_registration_policy(),
            analysis: default_analysis_policy(),
            text_modification: default_text_modification_policy(),
            health_check: default_health_check_policy(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
const MINUTE_MS: u64 = 60 * 1000;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_backend() -> StoreBackend {
    StoreBackend::Redis
}

fn default_store_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_store_timeout() -> u64 {
    500
}

fn default_connect_retries() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn policy(minutes: u64, max_requests: u64, identity: IdentityMode) -> PolicyConfig {
    PolicyConfig {
        window_ms: minutes * MINUTE_MS,
        max_requests,
        identity,
    }
}

fn default_general_policy() -> PolicyConfig {
    policy(15, 100, IdentityMode::Ip)
}

fn default_auth_policy() -> PolicyConfig {
    policy(15, 5, IdentityMode::Ip)
}

fn default_registration_policy() -> PolicyConfig {
    policy(60, 3, IdentityMode::Ip)
}

fn default_analysis_policy() -> PolicyConfig {
    policy(5, 10, IdentityMode::User)
}

fn default_text_modification_policy() -> PolicyConfig {
    policy(10, 20, IdentityMode::User)
}

fn default_health_check_policy() -> PolicyConfig {
    policy(1, 30, IdentityMode::Ip)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
