//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `PAYMENT_TOKEN_URL` - Card tokenization endpoint of the payment provider
//! - `PAYMENT_PUBLIC_KEY` - Public key sent with tokenization requests
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_API_URL` - Backend REST API root (default: `{STOREFRONT_BASE_URL}/api`)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `STORE_TAX_RATE` - VAT rate as a fraction (default: 0.07)
//! - `STORE_SHIPPING_FEE` - Standard shipping fee (default: 80)
//! - `STORE_EXPRESS_SHIPPING_FEE` - Express shipping fee (default: 150)
//! - `STORE_FREE_SHIPPING_THRESHOLD` - Standard shipping is free from here (default: 999)
//! - `STORE_PROMO_TABLE` - Path to a JSON promo table replacing the built-in one
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `pretty` (default) or `json`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gaojie_core::Amount;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::cart::{PricingConfig, ShippingRule};

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend REST API configuration
    pub backend: BackendConfig,
    /// Tax, shipping and promo settings
    pub store: StoreConfig,
    /// Payment provider configuration
    pub payment: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root, e.g. `https://gaojie.example/api`
    pub api_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Pricing configuration for the cart.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// VAT as a fraction (0.07 = 7 %)
    pub tax_rate: Decimal,
    /// Standard shipping fee
    pub shipping_fee: Amount,
    /// Express shipping fee
    pub express_shipping_fee: Amount,
    /// Discounted subtotal from which standard shipping is free
    pub free_shipping_threshold: Amount,
    /// Optional promo table file replacing the built-in codes
    pub promo_table_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(7, 2),
            shipping_fee: Amount::new(80),
            express_shipping_fee: Amount::new(150),
            free_shipping_threshold: Amount::new(999),
            promo_table_path: None,
        }
    }
}

impl StoreConfig {
    /// Pricing rules derived from this configuration.
    #[must_use]
    pub const fn pricing(&self) -> PricingConfig {
        PricingConfig {
            tax_rate: self.tax_rate,
            standard: ShippingRule {
                fee: self.shipping_fee,
                free_threshold: Some(self.free_shipping_threshold),
            },
            express: ShippingRule {
                fee: self.express_shipping_fee,
                free_threshold: None,
            },
        }
    }
}

/// Payment provider configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Card tokenization endpoint
    pub token_url: Url,
    /// Public key used to authenticate tokenization requests
    pub public_key: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("token_url", &self.token_url.as_str())
            .field("public_key", &"[REDACTED]")
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
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the payment key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let backend = BackendConfig::from_env(&base_url)?;
        let store = StoreConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let log_format = parse_env_or_default::<LogFormat>("LOG_FORMAT", "pretty")?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            store,
            payment,
            sentry_dsn,
            sentry_environment,
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BackendConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let raw = get_optional_env("BACKEND_API_URL").unwrap_or_else(|| format!("{base_url}/api"));
        let api_url = parse_api_url(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e))?;
        let timeout_secs = parse_env_or_default::<u64>("BACKEND_TIMEOUT_SECS", "15")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BACKEND_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let tax_rate = parse_env_or_default::<Decimal>("STORE_TAX_RATE", "0.07")?;
        if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "STORE_TAX_RATE".to_string(),
                "must be a fraction between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            tax_rate,
            shipping_fee: Amount::new(parse_env_or_default("STORE_SHIPPING_FEE", "80")?),
            express_shipping_fee: Amount::new(parse_env_or_default(
                "STORE_EXPRESS_SHIPPING_FEE",
                "150",
            )?),
            free_shipping_threshold: Amount::new(parse_env_or_default(
                "STORE_FREE_SHIPPING_THRESHOLD",
                "999",
            )?),
            promo_table_path: get_optional_env("STORE_PROMO_TABLE").map(PathBuf::from),
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("PAYMENT_TOKEN_URL")?;
        let token_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PAYMENT_TOKEN_URL".to_string(), e.to_string()))?;
        let public_key = get_required_env("PAYMENT_PUBLIC_KEY")?;
        validate_not_placeholder(&public_key, "PAYMENT_PUBLIC_KEY")?;

        Ok(Self {
            token_url,
            public_key: SecretString::from(public_key),
        })
    }

    /// Expose the public key for request signing.
    #[must_use]
    pub fn public_key(&self) -> &str {
        self.public_key.expose_secret()
    }
}

/// Parse an API root, normalizing it to end with `/` so relative joins keep
/// the last path segment.
pub fn parse_api_url(raw: &str) -> Result<Url, String> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject values that look like copy-pasted placeholders.
fn validate_not_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if value.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                api_url: parse_api_url("http://localhost:5000/api").unwrap(),
                timeout: Duration::from_secs(15),
            },
            store: StoreConfig::default(),
            payment: PaymentConfig {
                token_url: Url::parse("https://vault.payments.test/tokens").unwrap(),
                public_key: SecretString::from("pkey_live_5xq9zk2m"),
            },
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_payment_config_debug_redacts_key() {
        let debug_output = format!("{:?}", test_config().payment);
        assert!(debug_output.contains("vault.payments.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pkey_live_5xq9zk2m"));
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let result = validate_not_placeholder("your-public-key", "PAYMENT_PUBLIC_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_not_placeholder("changeme", "PAYMENT_PUBLIC_KEY").is_err());
        assert!(validate_not_placeholder("pkey_test_5abc", "PAYMENT_PUBLIC_KEY").is_ok());
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let url = parse_api_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("products/featured").unwrap().as_str(),
            "http://localhost:5000/api/products/featured"
        );
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_store_pricing() {
        let pricing = StoreConfig::default().pricing();
        assert_eq!(pricing.tax_rate, Decimal::new(7, 2));
        assert_eq!(pricing.standard.fee, Amount::new(80));
        assert_eq!(pricing.standard.free_threshold, Some(Amount::new(999)));
        assert_eq!(pricing.express.fee, Amount::new(150));
        assert_eq!(pricing.express.free_threshold, None);
    }
}
