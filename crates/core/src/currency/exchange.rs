//! The stored USDT to JOD exchange rate.

use chrono::{DateTime, Utc};
use daftar_shared::types::ExchangeRateId;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Decimal places kept on an exchange rate.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// Largest rate the `NUMERIC(19,6)` rate columns can hold.
pub const MAX_RATE: Decimal = Decimal::from_parts(2_313_682_943, 2_328_306_436, 0, false, 6);

/// The single exchange rate record: JOD per one USDT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// Record id.
    pub id: ExchangeRateId,
    /// JOD per one USDT.
    pub rate: Decimal,
    /// Who last set the rate.
    pub updated_by: String,
    /// When the rate was last set.
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Creates a new record after validating the rate.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidExchangeRate` if the rate is not positive
    /// or above [`MAX_RATE`].
    pub fn new(
        rate: Decimal,
        updated_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            id: ExchangeRateId::new(),
            rate: validate_rate(rate)?,
            updated_by: updated_by.into(),
            updated_at: now,
        })
    }

    /// Replaces the rate, keeping the record id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidExchangeRate` if the rate is not positive
    /// or above [`MAX_RATE`].
    pub fn set(
        &mut self,
        rate: Decimal,
        updated_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.rate = validate_rate(rate)?;
        self.updated_by = updated_by.into();
        self.updated_at = now;
        Ok(())
    }
}

/// Checks that a rate is strictly positive and trims it to six places.
///
/// # Errors
///
/// Returns `LedgerError::InvalidExchangeRate` if the trimmed rate is zero,
/// negative or above [`MAX_RATE`].
pub fn validate_rate(rate: Decimal) -> Result<Decimal, LedgerError> {
    let trimmed = rate
        .round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
        .normalize();
    if trimmed <= Decimal::ZERO || trimmed > MAX_RATE {
        return Err(LedgerError::InvalidExchangeRate(rate));
    }
    Ok(trimmed)
}
