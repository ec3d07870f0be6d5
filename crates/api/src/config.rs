//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIELDOPS_JWT_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//! - `FIELDOPS_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed with `FIELDOPS_STORE=memory`)
//!
//! ## Optional
//! - `FIELDOPS_STORE` - `postgres` (default) or `memory`
//! - `FIELDOPS_HOST` - Bind address (default: 127.0.0.1)
//! - `FIELDOPS_PORT` - Listen port (default: 5000)
//! - `FIELDOPS_TOKEN_TTL_DAYS` - Bearer token lifetime in days, 1 to 3650 (default: 30)
//! - `FIELDOPS_LOG_FORMAT` - `text` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Token lifetime from a day count in `1..=MAX_TOKEN_TTL_DAYS`.
fn token_ttl(days: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
        return Err(ConfigError::InvalidEnvVar(
            "FIELDOPS_TOKEN_TTL_DAYS".to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_DAYS} days (got {days})"),
        ));
    }
    Ok(chrono::Duration::days(days))
}

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which store backs the service.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// `PostgreSQL` at the given URL.
    Postgres { database_url: SecretString },
    /// In-process store; data is lost on restart.
    Memory,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Store backend
    pub store: StoreConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Secret used to sign bearer tokens
    pub jwt_secret: SecretString,
    /// Lifetime of issued bearer tokens
    pub token_ttl: chrono::Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Error tracking
    pub sentry: SentryConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = match get_env_or_default("FIELDOPS_STORE", "postgres").as_str() {
            "postgres" => StoreConfig::Postgres {
                database_url: get_database_url("FIELDOPS_DATABASE_URL")?,
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "FIELDOPS_STORE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let host = parse_env("FIELDOPS_HOST", "127.0.0.1")?;
        let port = parse_env("FIELDOPS_PORT", "5000")?;

        let jwt_secret = get_required_env("FIELDOPS_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "FIELDOPS_JWT_SECRET")?;

        let token_ttl = token_ttl(parse_env(
            "FIELDOPS_TOKEN_TTL_DAYS",
            &DEFAULT_TOKEN_TTL_DAYS.to_string(),
        )?)?;

        let log_format = match get_env_or_default("FIELDOPS_LOG_FORMAT", "text").as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "FIELDOPS_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        let sentry = SentryConfig {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            store,
            host,
            port,
            jwt_secret: SecretString::from(jwt_secret),
            token_ttl,
            log_format,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that the signing secret is long, not a placeholder, and random-looking.
fn validate_jwt_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_jwt_secret_too_short() {
        let err = validate_jwt_secret("aB3$xY9!", "TEST").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_jwt_secret_placeholder() {
        let err = validate_jwt_secret("changeme-changeme-changeme-changeme", "TEST").unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_jwt_secret_low_entropy() {
        let err = validate_jwt_secret(&"ab".repeat(20), "TEST").unwrap_err();
        assert!(err.to_string().contains("entropy"));
    }

    #[test]
    fn test_jwt_secret_valid() {
        assert!(validate_jwt_secret(STRONG, "TEST").is_ok());
    }

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(token_ttl(30).unwrap(), chrono::Duration::days(30));
        assert_eq!(
            token_ttl(MAX_TOKEN_TTL_DAYS).unwrap(),
            chrono::Duration::days(MAX_TOKEN_TTL_DAYS)
        );
        for days in [0, -1, MAX_TOKEN_TTL_DAYS + 1, 100_000_000, i64::MAX] {
            assert!(
                matches!(token_ttl(days), Err(ConfigError::InvalidEnvVar(_, _))),
                "{days} accepted"
            );
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            store: StoreConfig::Memory,
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            jwt_secret: SecretString::from(STRONG),
            token_ttl: chrono::Duration::days(30),
            log_format: LogFormat::Text,
            sentry: SentryConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ApiConfig {
            store: StoreConfig::Postgres {
                database_url: SecretString::from("postgres://fieldops:hunter2@db/fieldops"),
            },
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            jwt_secret: SecretString::from(STRONG),
            token_ttl: chrono::Duration::days(30),
            log_format: LogFormat::Json,
            sentry: SentryConfig::default(),
        };

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains(STRONG));
    }
}
