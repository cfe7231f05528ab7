// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, prefix `TEXTLENS__`)
    /// 2. Config file (`path`, or `~/.textlens/config.toml`)
    /// 3. Defaults (lowest)
    ///
    /// CLI overrides are applied on top by the caller.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file; an explicit path must exist
            .add_source(File::from(file).required(required))
            // Override with environment variables, e.g. TEXTLENS__STORE__URL
            .add_source(
                Environment::with_prefix("TEXTLENS")
                    .prefix_separator("__")
                    .separator("__")
            )
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".textlens")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::IdentityMode;
    use std::io::Write;

    #[test]
    fn test_defaults_match_policy_table() {
        let config = AppConfig::default();
        assert_eq!(config.cache.analysis_ttl_seconds, 3600);

        let rl = &config.rate_limit;
        assert_eq!((rl.general.window_ms, rl.general.max_requests), (900_000, 100));
        assert_eq!((rl.auth.window_ms, rl.auth.max_requests), (900_000, 5));
        assert_eq!((rl.registration.window_ms, rl.registration.max_requests), (3_600_000, 3));
        assert_eq!((rl.analysis.window_ms, rl.analysis.max_requests), (300_000, 10));
        assert_eq!(
            (rl.text_modification.window_ms, rl.text_modification.max_requests),
            (600_000, 20)
        );
        assert_eq!((rl.health_check.window_ms, rl.health_check.max_requests), (60_000, 30));
        assert_eq!(rl.analysis.identity, IdentityMode::User);
        assert_eq!(rl.text_modification.identity, IdentityMode::User);
        assert_eq!(rl.general.identity, IdentityMode::Ip);
    }

    #[test]
    fn test_policy_lookup() {
        let config = RateLimitConfig::default();
        let policy = config.policy("registration").unwrap();
        assert_eq!(policy.purpose, "registration");
        assert_eq!(policy.max_requests, 3);
        assert!(config.policy("unknown").is_none());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8088

[store]
backend = "memory"

[rate_limit.analysis]
window_ms = 1000
max_requests = 2
identity = "ip"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.rate_limit.analysis.max_requests, 2);
        assert_eq!(config.rate_limit.analysis.identity, IdentityMode::Ip);
        // Untouched sections keep their defaults
        assert_eq!(config.rate_limit.general.max_requests, 100);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/textlens.toml")));
        assert!(result.is_err());
    }
}
