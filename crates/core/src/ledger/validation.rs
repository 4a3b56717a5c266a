//! Journal line checks and the per-currency balance rule.
//!
//! Runs before any mutation. A rejected entry never touches a balance.

use daftar_shared::types::{AccountId, Currency, MAX_AMOUNT, checked_money_add, round_money};
use rust_decimal::Decimal;

use super::error::{LedgerError, LineProblem};
use super::types::{EntryTotals, JournalLineInput};
use crate::account::BalanceSide;

/// Minimum number of lines in a journal entry.
pub const MIN_LINES: usize = 2;

/// A structurally valid line: one side, positive, at most 2 dp, at most
/// [`MAX_AMOUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedLine {
    /// Target account.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: BalanceSide,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
}

/// Checks one line. `index` is the zero-based position reported on failure.
///
/// # Errors
///
/// Returns `LedgerError::InvalidLineInput` describing the first problem found.
pub fn check_line(index: usize, line: &JournalLineInput) -> Result<CheckedLine, LedgerError> {
    let fail = |problem| LedgerError::InvalidLineInput {
        line: index,
        problem,
    };

    let account_id = line.account_id.ok_or_else(|| fail(LineProblem::MissingAccount))?;
    let currency = line.currency.ok_or_else(|| fail(LineProblem::MissingCurrency))?;

    let (debit, credit) = (line.debit_amount, line.credit_amount);
    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(fail(LineProblem::NegativeAmount));
    }

    let (side, amount) = match (debit > Decimal::ZERO, credit > Decimal::ZERO) {
        (true, true) => return Err(fail(LineProblem::BothSides)),
        (false, false) => return Err(fail(LineProblem::NoAmount)),
        (true, false) => (BalanceSide::Debit, debit),
        (false, true) => (BalanceSide::Credit, credit),
    };

    if round_money(amount) != amount {
        return Err(fail(LineProblem::ExcessPrecision));
    }
    if amount > MAX_AMOUNT {
        return Err(fail(LineProblem::AmountTooLarge));
    }

    Ok(CheckedLine {
        account_id,
        side,
        amount,
        currency,
    })
}

/// Checks every line and the minimum line count.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientLines` for fewer than two lines, or the
/// first line error in input order.
pub fn check_lines(lines: &[JournalLineInput]) -> Result<Vec<CheckedLine>, LedgerError> {
    if lines.len() < MIN_LINES {
        return Err(LedgerError::InsufficientLines(lines.len()));
    }

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| check_line(index, line))
        .collect()
}

/// Sums debits and credits per currency, each total rounded to 2 dp.
///
/// # Errors
///
/// Returns `LedgerError::AmountOutOfRange` if a total leaves the storable
/// range.
pub fn compute_totals(lines: &[CheckedLine]) -> Result<EntryTotals, LedgerError> {
    let sum = |currency: Currency, side: BalanceSide| {
        lines
            .iter()
            .filter(|l| l.currency == currency && l.side == side)
            .try_fold(Decimal::ZERO, |total, l| checked_money_add(total, l.amount))
            .map(round_money)
            .ok_or_else(|| LedgerError::out_of_range(format!("{currency} {side} total")))
    };

    Ok(EntryTotals {
        total_debits_jod: sum(Currency::Jod, BalanceSide::Debit)?,
        total_credits_jod: sum(Currency::Jod, BalanceSide::Credit)?,
        total_debits_usdt: sum(Currency::Usdt, BalanceSide::Debit)?,
        total_credits_usdt: sum(Currency::Usdt, BalanceSide::Credit)?,
    })
}

/// Verifies that debits equal credits in every currency.
///
/// A currency without activity is balanced at 0 == 0. Currencies are checked
/// in the order JOD, USDT, and the first mismatch is reported.
///
/// # Errors
///
/// Returns `LedgerError::ImbalancedEntry` naming the currency and its totals,
/// or the error from [`compute_totals`].
pub fn validate_balance(lines: &[CheckedLine]) -> Result<EntryTotals, LedgerError> {
    let totals = compute_totals(lines)?;

    for currency in Currency::ALL {
        let (debits, credits) = totals.for_currency(currency);
        if debits != credits {
            return Err(LedgerError::ImbalancedEntry {
                currency,
                debits,
                credits,
            });
        }
    }

    Ok(totals)
}
