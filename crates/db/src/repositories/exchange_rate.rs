//! Exchange rate repository: the single JOD-per-USDT rate record.

use chrono::Utc;
use daftar_core::LedgerError;
use daftar_core::currency::ExchangeRate;
use daftar_core::store::SYSTEM_USER;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};
use tracing::info;

use super::error::{db_err, is_unique_violation};
use crate::entities::exchange_rates;

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
    default_rate: Decimal,
}

impl ExchangeRateRepository {
    /// Creates a repository that stores `default_rate` on first read.
    #[must_use]
    pub const fn new(db: DatabaseConnection, default_rate: Decimal) -> Self {
        Self { db, default_rate }
    }

    /// Returns the rate record, inserting the configured default if none
    /// exists yet.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidExchangeRate` if the configured default
    /// is not positive, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn current(&self) -> Result<ExchangeRate, LedgerError> {
        if let Some(rate) = self.find().await? {
            return Ok(rate);
        }

        let default = ExchangeRate::new(self.default_rate, SYSTEM_USER, Utc::now())?;
        match exchange_rates::ActiveModel::from(&default).insert(&self.db).await {
            Ok(row) => {
                info!(rate = %row.rate, "Default exchange rate stored");
                Ok(row.into())
            }
            // Another caller stored the default first.
            Err(e) if is_unique_violation(&e) => self
                .find()
                .await?
                .ok_or_else(|| LedgerError::Internal("exchange rate vanished after insert race".into())),
            Err(e) => Err(db_err(e)),
        }
    }

    /// Replaces the rate, keeping the record id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidExchangeRate` unless `rate > 0`, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set(&self, rate: Decimal, updated_by: &str) -> Result<ExchangeRate, LedgerError> {
        let mut record = self.current().await?;
        record.set(rate, updated_by, Utc::now())?;

        let row = exchange_rates::ActiveModel::from(&record)
            .update(&self.db)
            .await
            .map_err(db_err)?;

        info!(rate = %row.rate, updated_by = %row.updated_by, "Exchange rate updated");
        Ok(row.into())
    }

    async fn find(&self) -> Result<Option<ExchangeRate>, LedgerError> {
        let row = exchange_rates::Entity::find()
            .order_by_desc(exchange_rates::Column::UpdatedAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }
}
