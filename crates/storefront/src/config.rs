//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` - Storefront API public access token
//!
//! ## Optional
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token;
//!   used instead of the public token when set (placeholder and entropy checked)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `REUSE_CART_FILE` - Where the cart ID is remembered (default: .reuse-cart.json)
//! - `REUSE_HTTP_TIMEOUT_SECS` - Per-request timeout for Storefront API calls
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_VERSION: &str = "2026-01";
const DEFAULT_CART_FILE: &str = ".reuse-cart.json";
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

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// File holding the remembered cart ID
    pub cart_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Storefront API public access token (safe to expose in browser)
    pub storefront_public_token: String,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: Option<SecretString>,
    /// Per-request timeout; none by default
    pub http_timeout: Option<Duration>,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_public_token", &self.storefront_public_token)
            .field(
                "storefront_private_token",
                &self.storefront_private_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("http_timeout", &self.http_timeout)
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
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let shopify = ShopifyStorefrontConfig::load(&env)?;
        let cart_file = PathBuf::from(env.or_default("REUSE_CART_FILE", DEFAULT_CART_FILE));
        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");

        Ok(Self {
            shopify,
            cart_file,
            sentry_dsn,
            sentry_environment,
        })
    }
}

impl ShopifyStorefrontConfig {
    fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let storefront_private_token = env
            .optional("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")
            .map(|value| {
                validate_secret_strength(&value, "SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?;
                Ok(SecretString::from(value))
            })
            .transpose()?;

        let http_timeout = env
            .optional("REUSE_HTTP_TIMEOUT_SECS")
            .map(|value| {
                value.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("REUSE_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let config = Self {
            store: env.required("SHOPIFY_STORE")?,
            api_version: env.or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            storefront_public_token: env.required("SHOPIFY_STOREFRONT_PUBLIC_TOKEN")?,
            storefront_private_token,
            http_timeout,
        };

        // Fail at startup rather than on the first request.
        config.endpoint()?;
        Ok(config)
    }

    /// GraphQL endpoint for this store and API version.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the store domain does not form
    /// a valid URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let raw = format!(
            "https://{}/api/{}/graphql.json",
            self.store, self.api_version
        );
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_STORE".to_string(), e.to_string()))?;
        let expected_path = format!("/api/{}/graphql.json", self.api_version);
        if url.host_str().is_none_or(str::is_empty) || url.path() != expected_path {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_STORE".to_string(),
                format!("'{}' is not a bare store domain", self.store),
            ));
        }
        Ok(url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the usual required/optional/default accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable. Blank counts as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by Shopify."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GOOD_TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    fn shopify(store: &str) -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: store.to_string(),
            api_version: "2026-01".to_string(),
            storefront_public_token: "public".to_string(),
            storefront_private_token: None,
            http_timeout: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength(GOOD_TOKEN, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let vars = [
            ("SHOPIFY_STORE", "reuse.myshopify.com"),
            ("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "public"),
        ];
        let config = StorefrontConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.shopify.api_version, "2026-01");
        assert_eq!(config.cart_file, PathBuf::from(".reuse-cart.json"));
        assert!(config.shopify.storefront_private_token.is_none());
        assert!(config.shopify.http_timeout.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_full_config() {
        let vars = [
            ("SHOPIFY_STORE", "reuse.myshopify.com"),
            ("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "public"),
            ("SHOPIFY_STOREFRONT_PRIVATE_TOKEN", GOOD_TOKEN),
            ("SHOPIFY_API_VERSION", "2025-10"),
            ("REUSE_CART_FILE", "/tmp/cart.json"),
            ("REUSE_HTTP_TIMEOUT_SECS", "15"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ];
        let config = StorefrontConfig::from_lookup(lookup(&vars)).unwrap();

        assert!(config.shopify.storefront_private_token.is_some());
        assert_eq!(config.shopify.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.cart_file, PathBuf::from("/tmp/cart.json"));
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
        assert_eq!(
            config.shopify.endpoint().unwrap().as_str(),
            "https://reuse.myshopify.com/api/2025-10/graphql.json"
        );
    }

    #[test]
    fn test_missing_store() {
        let vars = [("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "public")];
        let err = StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SHOPIFY_STORE"));
    }

    #[test]
    fn test_blank_public_token_is_missing() {
        let vars = [
            ("SHOPIFY_STORE", "reuse.myshopify.com"),
            ("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "  "),
        ];
        let err = StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_placeholder_private_token_rejected() {
        let vars = [
            ("SHOPIFY_STORE", "reuse.myshopify.com"),
            ("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "public"),
            ("SHOPIFY_STOREFRONT_PRIVATE_TOKEN", "your-private-token"),
        ];
        let err = StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let vars = [
            ("SHOPIFY_STORE", "reuse.myshopify.com"),
            ("SHOPIFY_STOREFRONT_PUBLIC_TOKEN", "public"),
            ("REUSE_HTTP_TIMEOUT_SECS", "soon"),
        ];
        let err = StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(ref key, _) if key == "REUSE_HTTP_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_endpoint_rejects_urls_as_store() {
        assert!(shopify("reuse.myshopify.com").endpoint().is_ok());
        assert!(shopify("https://reuse.myshopify.com").endpoint().is_err());
        assert!(shopify("reuse.myshopify.com/admin").endpoint().is_err());
        assert!(shopify("").endpoint().is_err());
    }

    #[test]
    fn test_shopify_config_debug_redacts_secrets() {
        let mut config = shopify("test.myshopify.com");
        config.storefront_public_token = "public_token_value".to_string();
        config.storefront_private_token = Some(SecretString::from("super_secret_private_token"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("test.myshopify.com"));
        assert!(debug_output.contains("public_token_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_token"));
    }
}
