//! Configuration for Products API

use axum_helpers::{JwtConfig, RateLimitConfig};
use core_config::{app_info, env_or_default, env_parse, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;
use domain_products::{DEFAULT_FEED_CAPACITY, DEFAULT_LOCALE};

pub use core_config::Environment;

/// Prefix of the product-specific variables (`PRODUCTS_RATE_LIMIT_CALLS`, ...)
const ENV_PREFIX: &str = "PRODUCTS";

/// Product domain settings
#[derive(Clone, Debug)]
pub struct ProductsConfig {
    pub rate_limit: RateLimitConfig,
    /// Changes buffered per live view before it is reset
    pub feed_capacity: usize,
    pub default_locale: String,
}

impl FromEnv for ProductsConfig {
    fn from_env() -> Result<Self, core_config::ConfigError> {
        Ok(Self {
            rate_limit: RateLimitConfig::from_env_prefixed(ENV_PREFIX)?,
            feed_capacity: env_parse("PRODUCTS_FEED_CAPACITY", DEFAULT_FEED_CAPACITY)?,
            default_locale: env_or_default("PRODUCTS_DEFAULT_LOCALE", DEFAULT_LOCALE),
        })
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub products: ProductsConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            mongodb: MongoConfig::from_env()?,
            server: ServerConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            products: ProductsConfig::from_env()?,
            environment: Environment::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_config_defaults() {
        temp_env::with_vars_unset(
            [
                "PRODUCTS_RATE_LIMIT_CALLS",
                "PRODUCTS_RATE_LIMIT_WINDOW_MS",
                "PRODUCTS_FEED_CAPACITY",
                "PRODUCTS_DEFAULT_LOCALE",
            ],
            || {
                let config = ProductsConfig::from_env().unwrap();
                assert_eq!(config.rate_limit, RateLimitConfig::default());
                assert_eq!(config.feed_capacity, 256);
                assert_eq!(config.default_locale, "en");
            },
        );
    }

    #[test]
    fn test_products_config_overrides() {
        temp_env::with_vars(
            [
                ("PRODUCTS_FEED_CAPACITY", Some("1024")),
                ("PRODUCTS_DEFAULT_LOCALE", Some("fr")),
            ],
            || {
                let config = ProductsConfig::from_env().unwrap();
                assert_eq!(config.feed_capacity, 1024);
                assert_eq!(config.default_locale, "fr");
            },
        );
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("JWT_SECRET", None::<&str>),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
