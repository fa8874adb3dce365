// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::Path;
use anyhow::{bail, Result};
use figment::{Figment, providers::{Env, Format, Serialized, Toml}};
use serde::{Deserialize, Serialize};

use crate::auth::password::PasswordRequirements;
use crate::auth::rate_limit::RateLimitPolicy;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Database connection string
    pub database_url: String,
    /// Connection pool size
    pub max_db_connections: u32,
    /// Log level
    pub log_level: String,
    /// Allowed CORS origins; "*" allows any origin
    pub cors_origins: Vec<String>,
    /// Token signing settings
    pub jwt: JwtSettings,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
    /// Per-route-class request budgets
    pub rate_limit: RateLimitSettings,
}

/// Token signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    /// HMAC signing secret
    pub secret: String,
    /// Access token lifetime in minutes
    pub access_ttl_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_ttl_days: i64,
}

/// Request budgets per route class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub login: RateLimitPolicy,
    pub register: RateLimitPolicy,
    pub password_reset: RateLimitPolicy,
    pub default: RateLimitPolicy,
}

impl RateLimitSettings {
    /// Pick the policy for a request path
    pub fn policy_for(&self, path: &str) -> RateLimitPolicy {
        if path.ends_with("/login") {
            self.login
        } else if path.ends_with("/register") {
            self.register
        } else if path.ends_with("/forgot-password") || path.ends_with("/reset-password") {
            self.password_reset
        } else {
            self.default
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".parse().unwrap(),
            database_url: "sqlite://curagenie.db".to_string(),
            max_db_connections: 5,
            log_level: "info".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            jwt: JwtSettings::default(),
            password_requirements: PasswordRequirements::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: "development-secret-key-change-in-production".to_string(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login: RateLimitPolicy { max_requests: 5, window_secs: 300 },
            register: RateLimitPolicy { max_requests: 3, window_secs: 600 },
            password_reset: RateLimitPolicy { max_requests: 3, window_secs: 3600 },
            default: RateLimitPolicy { max_requests: 100, window_secs: 60 },
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from a specific config file and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CURAGENIE_").split("__"))
            .extract()?;

        // Well-known deployment variables take precedence over everything
        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database_url = url;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET_KEY").or_else(|_| std::env::var("SECRET_KEY")) {
            settings.jwt.secret = secret;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            settings.cors_origins = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check internal consistency of the loaded settings
    pub fn validate(&self) -> Result<()> {
        const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }

        if self.jwt.secret.len() < 32 {
            bail!("jwt secret must be at least 32 characters");
        }

        if self.jwt.access_ttl_minutes < 1 {
            bail!("access token TTL must be at least one minute");
        }

        if self.jwt.refresh_ttl_days < 1 {
            bail!("refresh token TTL must be at least one day");
        }

        // An access token must always expire before its paired refresh token
        if self.jwt.access_ttl_minutes >= self.jwt.refresh_ttl_days * 24 * 60 {
            bail!("access token TTL must be shorter than refresh token TTL");
        }

        if self.max_db_connections == 0 {
            bail!("max_db_connections must be at least 1");
        }

        if self.password_requirements.min_length < crate::auth::password::MIN_PASSWORD_LENGTH {
            bail!(
                "password min_length must be at least {}",
                crate::auth::password::MIN_PASSWORD_LENGTH
            );
        }

        if self.password_requirements.work_factor < crate::auth::password::MIN_WORK_FACTOR {
            bail!(
                "password work factor must be at least {}",
                crate::auth::password::MIN_WORK_FACTOR
            );
        }

        for policy in [
            self.rate_limit.login,
            self.rate_limit.register,
            self.rate_limit.password_reset,
            self.rate_limit.default,
        ] {
            if policy.max_requests == 0 || policy.window_secs == 0 {
                bail!("rate limit policies need a non-zero budget and window");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        // Invalid log level
        let mut invalid = Settings::default();
        invalid.log_level = "loud".to_string();
        assert!(invalid.validate().is_err());

        // Short secret
        let mut invalid = Settings::default();
        invalid.jwt.secret = "short".to_string();
        assert!(invalid.validate().is_err());

        // Access TTL not shorter than refresh TTL
        let mut invalid = Settings::default();
        invalid.jwt.access_ttl_minutes = 8 * 24 * 60;
        assert!(invalid.validate().is_err());

        // Zero-length password requirement
        let mut invalid = Settings::default();
        invalid.password_requirements.min_length = 4;
        assert!(invalid.validate().is_err());

        // Work factor below the floor
        let mut invalid = Settings::default();
        invalid.password_requirements.work_factor = 4;
        assert!(invalid.validate().is_err());

        // Degenerate rate limit
        let mut invalid = Settings::default();
        invalid.rate_limit.login.max_requests = 0;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_policy_for_route_classes() {
        let settings = Settings::default();

        assert_eq!(
            settings.rate_limit.policy_for("/api/auth/login").max_requests,
            5
        );
        assert_eq!(
            settings.rate_limit.policy_for("/api/auth/register").max_requests,
            3
        );
        assert_eq!(
            settings
                .rate_limit
                .policy_for("/api/auth/forgot-password")
                .window_secs,
            3600
        );
        assert_eq!(
            settings.rate_limit.policy_for("/api/auth/me").max_requests,
            100
        );
    }

    fn clear_deployment_env() {
        for var in ["DATABASE_URL", "JWT_SECRET_KEY", "SECRET_KEY", "CORS_ORIGINS"] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_toml_file() {
        clear_deployment_env();
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
            bind_addr = "127.0.0.1:9000"
            log_level = "debug"

            [jwt]
            secret = "file-provided-secret-key-at-least-32-chars"
            access_ttl_minutes = 30
            refresh_ttl_days = 14
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.jwt.access_ttl_minutes, 30);
        // Unset fields keep their defaults
        assert_eq!(settings.rate_limit.login.max_requests, 5);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        clear_deployment_env();
        let temp_dir = tempdir().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings.jwt.access_ttl_minutes, 15);
        assert_eq!(settings.jwt.refresh_ttl_days, 7);
    }
}
