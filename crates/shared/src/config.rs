//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JOD per USDT used when no exchange rate has been stored yet.
    #[serde(default = "default_exchange_rate")]
    pub default_exchange_rate: Decimal,
    /// Lifetime of cached account listings, in seconds.
    #[serde(default = "default_account_cache_ttl")]
    pub account_cache_ttl_secs: u64,
    /// Maximum number of cached account listings.
    #[serde(default = "default_account_cache_capacity")]
    pub account_cache_capacity: u64,
}

/// Exchange rate stored on first read when none exists.
#[must_use]
pub fn default_exchange_rate() -> Decimal {
    Decimal::new(71, 2)
}

fn default_account_cache_ttl() -> u64 {
    60
}

fn default_account_cache_capacity() -> u64 {
    256
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_exchange_rate: default_exchange_rate(),
            account_cache_ttl_secs: default_account_cache_ttl(),
            account_cache_capacity: default_account_cache_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DAFTAR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
