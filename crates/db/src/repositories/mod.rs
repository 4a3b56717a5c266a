//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
mod convert;
mod error;
pub mod exchange_rate;
pub mod journal;
mod unit_of_work;

pub use account::AccountRepository;
pub use exchange_rate::ExchangeRateRepository;
pub use journal::JournalRepository;

use daftar_core::account::AccountListCache;
use daftar_shared::config::LedgerConfig;
use sea_orm::DatabaseConnection;

/// All ledger repositories over one connection pool, sharing one account
/// listing cache.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Chart of accounts.
    pub accounts: AccountRepository,
    /// Journal entry lifecycle.
    pub journal: JournalRepository,
    /// Exchange rate record.
    pub rates: ExchangeRateRepository,
}

impl Repositories {
    /// Builds the repositories from the ledger configuration.
    #[must_use]
    pub fn new(db: &DatabaseConnection, config: &LedgerConfig) -> Self {
        let cache = AccountListCache::with_config(
            config.account_cache_capacity,
            config.account_cache_ttl_secs,
        );
        let rates = ExchangeRateRepository::new(db.clone(), config.default_exchange_rate);

        Self {
            accounts: AccountRepository::new(db.clone(), cache.clone()),
            journal: JournalRepository::new(db.clone(), rates.clone(), cache),
            rates,
        }
    }
}
