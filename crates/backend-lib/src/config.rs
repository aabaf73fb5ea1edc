// ============================
// gatekeeper-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `GATEKEEPER_`-prefixed environment variables (`__` separates nested
//! keys, e.g. `GATEKEEPER_RATE_LIMIT__BURST=10`).
use std::fmt;
use std::path::Path;
use std::time::Duration;

use axum::http::HeaderValue;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{HashAlgorithm, PasswordRequirements, SigningAlgorithm};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "GATEKEEPER_";
/// Config file read by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "gatekeeper.toml";
/// Minimum HMAC secret length outside development
pub const MIN_SECRET_LEN: usize = 32;

const DEV_SECRET: &str = "dev-only-signing-secret-change-before-deploying";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub jwt: JwtSettings,
    pub password: PasswordSettings,
    pub rate_limit: RateLimitSettings,
    pub session: SessionSettings,
    pub users: UserStoreSettings,
    pub monitor: MonitorSettings,
}

/// HTTP listener and request handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Deployment environment; `dev`/`development` relaxes cookie and secret checks
    pub env: String,
    /// Whole-request deadline
    pub request_timeout_secs: u64,
    /// Deadline for a single user-store or session-store call
    pub backend_timeout_ms: u64,
    /// Key the rate limiter on `X-Real-IP` / `X-Forwarded-For` instead of the peer address
    pub trust_proxy_headers: bool,
    /// Browser origins allowed to call the API with credentials
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            env: "dev".to_string(),
            request_timeout_secs: 10,
            backend_timeout_ms: 2_000,
            trust_proxy_headers: false,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_dev(&self) -> bool {
        self.env == "dev" || self.env == "development"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// JSON output; defaults to on when `server.env` is `prod`
    pub json: Option<bool>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: None,
        }
    }
}

/// Access-token signing.
///
/// `algorithm` is used both to sign and to verify; tokens carrying any other
/// algorithm are rejected.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    pub secret: String,
    pub algorithm: SigningAlgorithm,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            algorithm: SigningAlgorithm::default(),
        }
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    pub algorithm: HashAlgorithm,
    pub requirements: PasswordRequirements,
}

/// Token bucket parameters for the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Tokens added per second (r)
    pub refill_per_sec: f64,
    /// Bucket capacity (b)
    pub burst: u32,
    /// Buckets untouched for this long are dropped
    pub idle_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            refill_per_sec: 1.0,
            burst: 5,
            idle_ttl_secs: 10 * 60,
            cleanup_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub backend: SessionBackend,
    /// Sweep interval for the in-memory store
    pub cleanup_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            cleanup_interval_secs: 5 * 60,
        }
    }
}

/// Where refresh-token sessions live
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Redis {
        url: String,
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
}

fn default_key_prefix() -> String {
    "refresh:".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStoreSettings {
    pub backend: UserBackend,
}

/// Where user records live
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UserBackend {
    #[default]
    Memory,
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    10
}

/// Prometheus exporter listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9100,
        }
    }
}

impl Settings {
    /// Load settings from [`DEFAULT_CONFIG_FILE`] and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from `path` and the environment; a missing file is not an error
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log.level must be one of {VALID_LOG_LEVELS:?}"
            )));
        }

        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Invalid("jwt.secret must not be empty".into()));
        }

        if !self.server.is_dev()
            && (self.jwt.secret.len() < MIN_SECRET_LEN || self.jwt.secret == DEV_SECRET)
        {
            return Err(ConfigError::Invalid(format!(
                "jwt.secret must be a unique value of at least {MIN_SECRET_LEN} bytes outside dev"
            )));
        }

        if self.rate_limit.burst == 0 {
            return Err(ConfigError::Invalid("rate_limit.burst must be > 0".into()));
        }

        if !(self.rate_limit.refill_per_sec > 0.0) {
            return Err(ConfigError::Invalid(
                "rate_limit.refill_per_sec must be > 0".into(),
            ));
        }

        if self.password.requirements.min_length < 8 {
            return Err(ConfigError::Invalid(
                "password.requirements.min_length must be at least 8".into(),
            ));
        }

        if self.server.backend_timeout_ms == 0 || self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.backend_timeout_ms and server.request_timeout_secs must be > 0".into(),
            ));
        }

        // credentialed CORS cannot use a wildcard origin
        if let Some(origin) = self
            .server
            .cors_allowed_origins
            .iter()
            .find(|origin| *origin == "*" || HeaderValue::from_str(origin).is_err())
        {
            return Err(ConfigError::Invalid(format!(
                "server.cors_allowed_origins: `{origin}` is not an explicit origin"
            )));
        }

        if self.rate_limit.cleanup_interval_secs == 0 || self.session.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cleanup intervals must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Whether logs should be emitted as JSON
    pub fn log_json(&self) -> bool {
        self.log.json.unwrap_or(self.server.env == "prod")
    }
}
