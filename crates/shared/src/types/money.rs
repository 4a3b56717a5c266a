//! Money precision, limits and the settlement currencies.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places every stored amount and total is rounded to.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Largest amount a single journal line or opening balance may carry.
///
/// Fifteen integer digits, well inside the `NUMERIC(19,2)` storage columns.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_569_325_055, 23_283_064, 0, false, 2);

/// Largest magnitude an account balance or entry total may reach.
///
/// Seventeen integer digits, the full range of a `NUMERIC(19,2)` column.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(2_313_682_943, 2_328_306_436, 0, false, 2);

/// Adds two money values, failing instead of leaving the storable range.
///
/// Returns `None` on `Decimal` overflow or when the magnitude of the sum
/// exceeds [`MAX_BALANCE`].
#[must_use]
pub fn checked_money_add(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_add(b).filter(|sum| sum.abs() <= MAX_BALANCE)
}

/// Rounds an amount to money precision using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}

/// Settlement currencies supported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Jordanian Dinar, the reporting currency.
    Jod,
    /// Tether USD stablecoin.
    Usdt,
}

impl Currency {
    /// All supported currencies, reporting currency first.
    pub const ALL: [Self; 2] = [Self::Jod, Self::Usdt];

    /// Returns the ISO-style code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Jod => "JOD",
            Self::Usdt => "USDT",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JOD" => Ok(Self::Jod),
            "USDT" => Ok(Self::Usdt),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
