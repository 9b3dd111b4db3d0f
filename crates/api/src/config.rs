//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOCKROOM_JWT_SECRET` - HS256 signing secret (min 32 chars, high entropy)
//! - `STOCKROOM_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed with `STOCKROOM_STORE=memory`)
//!
//! ## Optional
//! - `STOCKROOM_STORE` - `postgres` (default) or `memory`
//! - `STOCKROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `STOCKROOM_PORT` - Listen port (default: 8000)
//! - `STOCKROOM_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `STOCKROOM_PAYMENT_SUCCESS_RATE` - Simulated approval probability (default: 0.75)
//! - `STOCKROOM_PAYMENT_LATENCY_MS` - Simulated processor latency (default: 0)
//! - `STOCKROOM_PAYMENT_TIMEOUT_MS` - Payment attempt timeout (default: 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Which store adapter the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Everything in process memory, lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

/// Simulated payment processor settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentConfig {
    /// Probability in `0.0..=1.0` that a charge is approved.
    pub success_rate: f64,
    /// Artificial processor latency.
    pub latency: Duration,
    /// Upper bound on one payment attempt.
    pub timeout: Duration,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.75,
            latency: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Sentry settings. Absent DSN disables reporting.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub store: StoreBackend,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing secret
    pub jwt_secret: SecretString,
    pub payment: PaymentConfig,
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
    /// if secrets fail validation (length, placeholder detection, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store: StoreBackend = parse_env_or_default("STOCKROOM_STORE", StoreBackend::Postgres)?;
        let database_url = match store {
            StoreBackend::Postgres => Some(get_database_url("STOCKROOM_DATABASE_URL")?),
            StoreBackend::Memory => get_optional_database_url("STOCKROOM_DATABASE_URL"),
        };
        let db_max_connections = parse_env_or_default("STOCKROOM_DB_MAX_CONNECTIONS", 10_u32)?;
        let host = parse_env_or_default("STOCKROOM_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_env_or_default("STOCKROOM_PORT", 8000_u16)?;

        let jwt_secret = jwt_secret_from_env()?;

        let payment = PaymentConfig::from_env()?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            store,
            database_url,
            db_max_connections,
            host,
            port,
            jwt_secret,
            payment,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let success_rate =
            parse_env_or_default("STOCKROOM_PAYMENT_SUCCESS_RATE", defaults.success_rate)?;
        validate_probability(success_rate, "STOCKROOM_PAYMENT_SUCCESS_RATE")?;

        let latency_ms = parse_env_or_default("STOCKROOM_PAYMENT_LATENCY_MS", 0_u64)?;
        let timeout_ms = parse_env_or_default("STOCKROOM_PAYMENT_TIMEOUT_MS", 5000_u64)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOCKROOM_PAYMENT_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            success_rate,
            latency: Duration::from_millis(latency_ms),
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sample_rate = parse_env_or_default("SENTRY_SAMPLE_RATE", 1.0_f32)?;
        validate_probability(f64::from(sample_rate), "SENTRY_SAMPLE_RATE")?;
        let traces_sample_rate = parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.0_f32)?;
        validate_probability(f64::from(traces_sample_rate), "SENTRY_TRACES_SAMPLE_RATE")?;

        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate,
            traces_sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Database URL for tools that always talk to `PostgreSQL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `STOCKROOM_DATABASE_URL`
/// nor `DATABASE_URL` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("STOCKROOM_DATABASE_URL")
}

/// The validated token signing secret.
///
/// # Errors
///
/// Returns `ConfigError` if `STOCKROOM_JWT_SECRET` is missing, short, a
/// placeholder, or low entropy.
pub fn jwt_secret_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    let secret = get_validated_secret("STOCKROOM_JWT_SECRET")?;
    validate_secret_length(&secret, "STOCKROOM_JWT_SECRET")?;
    Ok(secret)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    get_optional_database_url(primary_key)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn validate_probability(value: f64, var_name: &str) -> Result<(), ConfigError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be between 0.0 and 1.0 (got {value})"),
        ));
    }
    Ok(())
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
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

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-jwt-key-goes-here-0123456789", "JWT"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "JWT").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "JWT").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "JWT").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "JWT").is_ok());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" Postgres ".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_value_reports_variable() {
        let err = parse_value::<u16>("STOCKROOM_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOCKROOM_PORT"));
        assert_eq!(parse_value::<u16>("STOCKROOM_PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn test_probability_bounds() {
        assert!(validate_probability(0.0, "RATE").is_ok());
        assert!(validate_probability(1.0, "RATE").is_ok());
        assert!(validate_probability(1.01, "RATE").is_err());
        assert!(validate_probability(-0.1, "RATE").is_err());
        assert!(validate_probability(f64::NAN, "RATE").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            store: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 10,
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            jwt_secret: SecretString::from("x".repeat(32)),
            payment: PaymentConfig::default(),
            sentry: SentryConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ApiConfig {
            store: StoreBackend::Postgres,
            database_url: Some(SecretString::from("postgres://app:hunter2@db/stockroom")),
            db_max_connections: 10,
            host: "0.0.0.0".parse().unwrap(),
            port: 8000,
            jwt_secret: SecretString::from("zQ8#vN2@kL5!pX9$mR3&tW6*yB1^cF4%"),
            payment: PaymentConfig::default(),
            sentry: SentryConfig::default(),
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("zQ8#vN2"));
    }
}
