//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EGLYS_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either the server runs on the in-memory store)
//! - `EGLYS_HOST` - Bind address (default: 127.0.0.1)
//! - `EGLYS_PORT` - Listen port (default: 3000)
//! - `EGLYS_LOG_FORMAT` - `text` (default) or `json`
//! - `EGLYS_CHECKOUT_CLEAR_ATTEMPTS` - Cart cleanup attempts after an order is
//!   recorded (default: 3)
//! - `EGLYS_CHECKOUT_CLEAR_BACKOFF_MS` - Delay before the first cleanup retry
//!   (default: 50)
//! - `EGLYS_CHECKOUT_MAX_CONCURRENT` - Checkouts running at once (default: 8)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Log line format
    pub log_format: LogFormat,
    /// Checkout tuning
    pub checkout: CheckoutConfig,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?}, expected text or json")),
        }
    }
}

/// Checkout tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Attempts to remove ordered lines from the cart once the order exists.
    pub clear_attempts: u32,
    /// Delay before the first cleanup retry; doubled after each failure.
    pub clear_backoff: Duration,
    /// Checkouts allowed to run at once. Each one holds a pooled connection
    /// for its user lock, so this must stay below the pool size.
    pub max_concurrent: usize,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            clear_attempts: 3,
            clear_backoff: Duration::from_millis(50),
            max_concurrent: 8,
        }
    }
}

/// Sentry configuration.
///
/// Implements `Debug` manually to redact the DSN, which embeds the project key.
#[derive(Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let database_url = env
            .get("EGLYS_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from);

        let defaults = CheckoutConfig::default();
        let checkout = CheckoutConfig {
            clear_attempts: env
                .parse_or("EGLYS_CHECKOUT_CLEAR_ATTEMPTS", defaults.clear_attempts)?
                .max(1),
            clear_backoff: Duration::from_millis(env.parse_or(
                "EGLYS_CHECKOUT_CLEAR_BACKOFF_MS",
                u64::try_from(defaults.clear_backoff.as_millis()).unwrap_or(50),
            )?),
            max_concurrent: env
                .parse_or("EGLYS_CHECKOUT_MAX_CONCURRENT", defaults.max_concurrent)?
                .max(1),
        };

        let sentry = SentryConfig {
            dsn: env.get("SENTRY_DSN"),
            environment: env.get("SENTRY_ENVIRONMENT"),
            sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        };

        Ok(Self {
            database_url,
            host: env.parse_or("EGLYS_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parse_or("EGLYS_PORT", 3000)?,
            log_format: env.parse_or("EGLYS_LOG_FORMAT", LogFormat::Text)?,
            checkout,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Get the database URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if none is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("EGLYS_DATABASE_URL".to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source; empty values count as absent.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, or use the default if it is absent.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
