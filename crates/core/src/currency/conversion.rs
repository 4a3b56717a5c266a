//! Currency conversion between JOD and USDT.
//!
//! The rate is always JOD per one USDT. Results round to money precision
//! with banker's rounding.

use daftar_shared::types::{Currency, MAX_BALANCE, round_money};
use rust_decimal::Decimal;

use crate::ledger::LedgerError;

/// Converts `amount` from one currency to another at `rate` JOD per USDT.
///
/// USDT to JOD multiplies, JOD to USDT divides, and the same currency is
/// returned unchanged (still rounded).
///
/// # Errors
///
/// - `LedgerError::InvalidExchangeRate` if `rate` is not positive
/// - `LedgerError::AmountOutOfRange` if the result leaves the storable range
pub fn convert(
    amount: Decimal,
    from: Currency,
    to: Currency,
    rate: Decimal,
) -> Result<Decimal, LedgerError> {
    if rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidExchangeRate(rate));
    }

    let converted = match (from, to) {
        (Currency::Usdt, Currency::Jod) => amount.checked_mul(rate),
        (Currency::Jod, Currency::Usdt) => amount.checked_div(rate),
        _ => Some(amount),
    };

    converted
        .map(round_money)
        .filter(|c| c.abs() <= MAX_BALANCE)
        .ok_or_else(|| LedgerError::out_of_range(format!("{amount} {from} in {to} at rate {rate}")))
}

/// Returns `amount` in JOD; USDT amounts use `rate`.
///
/// # Errors
///
/// Same as [`convert`].
pub fn to_jod(amount: Decimal, currency: Currency, rate: Decimal) -> Result<Decimal, LedgerError> {
    convert(amount, currency, Currency::Jod, rate)
}
