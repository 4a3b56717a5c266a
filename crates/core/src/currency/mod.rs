//! Two-currency handling: JOD and USDT.

pub mod conversion;
pub mod exchange;

pub use conversion::{convert, to_jod};
pub use exchange::{ExchangeRate, MAX_RATE, RATE_DECIMAL_PLACES, validate_rate};
