//! Journal entry lifecycle: create, edit, void.
//!
//! The service is split in two phases. [`JournalService::prepare`] validates
//! and converts the caller's input without touching any state, so an
//! imbalanced entry fails before a unit of work is opened. The mutating
//! operations then run against an [`AccountBook`] the store has loaded inside
//! its unit of work; on error the store throws the book away.

use chrono::{DateTime, Utc};
use daftar_shared::types::{JournalEntryId, JournalLineId};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::posting::TransactionPoster;
use super::types::{
    JournalEntry, JournalEntryInput, JournalEntryLine, JournalStatus, LedgerTransaction,
    PostedEntry, PreparedEntry, PreparedLine,
};
use super::validation::{check_lines, validate_balance};
use crate::account::{AccountBook, BalanceSide};
use crate::currency::{to_jod, validate_rate};

/// Journal lifecycle operations.
///
/// Stateless; every operation receives the state it works on.
pub struct JournalService;

impl JournalService {
    /// Validates an entry and converts its lines at `rate` JOD per USDT.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InsufficientLines` / `LedgerError::InvalidLineInput`
    ///   for malformed lines
    /// - `LedgerError::ImbalancedEntry` if a currency does not balance
    /// - `LedgerError::ConstraintViolation` if the description is blank
    /// - `LedgerError::InvalidExchangeRate` if `rate` is not positive
    /// - `LedgerError::AmountOutOfRange` if a total or converted amount
    ///   does not fit the storable range
    pub fn prepare(input: &JournalEntryInput, rate: Decimal) -> Result<PreparedEntry, LedgerError> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(LedgerError::constraint("journal entry description is required"));
        }

        let checked = check_lines(&input.lines)?;
        let totals = validate_balance(&checked)?;
        let rate = validate_rate(rate)?;

        let lines = checked
            .iter()
            .zip(&input.lines)
            .map(|(line, raw)| {
                Ok(PreparedLine {
                    account_id: line.account_id,
                    side: line.side,
                    amount: line.amount,
                    currency: line.currency,
                    exchange_rate: rate,
                    converted_amount_jod: to_jod(line.amount, line.currency, rate)?,
                    description: non_blank(raw.description.as_deref()),
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        Ok(PreparedEntry {
            date: input.date,
            description: description.to_string(),
            reference: non_blank(input.reference.as_deref()),
            created_by: input.created_by.clone(),
            lines,
            totals,
            exchange_rate: rate,
        })
    }

    /// Creates a posted entry numbered `entry_number` and posts its lines.
    ///
    /// # Errors
    ///
    /// Propagates posting errors (`AccountNotFound`, `ConstraintViolation`).
    pub fn create(
        book: &mut AccountBook,
        prepared: &PreparedEntry,
        entry_number: i64,
        now: DateTime<Utc>,
    ) -> Result<PostedEntry, LedgerError> {
        let id = JournalEntryId::new();
        let lines = Self::build_lines(id, prepared);
        let transactions = TransactionPoster::post(book, id, prepared.date, &lines, now)?;

        let entry = JournalEntry {
            id,
            entry_number,
            date: prepared.date,
            description: prepared.description.clone(),
            reference: prepared.reference.clone(),
            status: JournalStatus::Posted,
            totals: prepared.totals,
            created_by: prepared.created_by.clone(),
            created_at: now,
            updated_at: now,
            lines,
        };

        Ok(PostedEntry {
            entry,
            transactions,
        })
    }

    /// Replaces a posted entry's content: reverses its transactions, swaps
    /// its lines and scalar fields, and posts the new lines.
    ///
    /// Number, status, creator and creation time are kept.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AlreadyVoided` if the entry is voided
    /// - reversal and posting errors
    pub fn edit(
        book: &mut AccountBook,
        existing: &JournalEntry,
        transactions: &[LedgerTransaction],
        prepared: &PreparedEntry,
        now: DateTime<Utc>,
    ) -> Result<PostedEntry, LedgerError> {
        if !existing.status.is_posted() {
            return Err(LedgerError::AlreadyVoided(existing.id));
        }

        TransactionPoster::reverse(book, transactions, now)?;

        let lines = Self::build_lines(existing.id, prepared);
        let transactions = TransactionPoster::post(book, existing.id, prepared.date, &lines, now)?;

        let entry = JournalEntry {
            id: existing.id,
            entry_number: existing.entry_number,
            date: prepared.date,
            description: prepared.description.clone(),
            reference: prepared.reference.clone(),
            status: existing.status,
            totals: prepared.totals,
            created_by: existing.created_by.clone(),
            created_at: existing.created_at,
            updated_at: now,
            lines,
        };

        Ok(PostedEntry {
            entry,
            transactions,
        })
    }

    /// Reverses a posted entry and marks it voided. The entry and its lines
    /// are kept; the caller deletes the transaction rows.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AlreadyVoided` if the entry is already voided
    /// - reversal errors
    pub fn void(
        book: &mut AccountBook,
        entry: &JournalEntry,
        transactions: &[LedgerTransaction],
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        if !entry.status.is_posted() {
            return Err(LedgerError::AlreadyVoided(entry.id));
        }

        TransactionPoster::reverse(book, transactions, now)?;

        let mut voided = entry.clone();
        voided.status = JournalStatus::Voided;
        voided.updated_at = now;
        Ok(voided)
    }

    fn build_lines(entry_id: JournalEntryId, prepared: &PreparedEntry) -> Vec<JournalEntryLine> {
        (0_i32..)
            .zip(&prepared.lines)
            .map(|(position, line)| {
                let (debit_amount, credit_amount) = match line.side {
                    BalanceSide::Debit => (line.amount, Decimal::ZERO),
                    BalanceSide::Credit => (Decimal::ZERO, line.amount),
                };
                JournalEntryLine {
                    id: JournalLineId::new(),
                    journal_entry_id: entry_id,
                    position,
                    account_id: line.account_id,
                    debit_amount,
                    credit_amount,
                    currency: line.currency,
                    exchange_rate: line.exchange_rate,
                    converted_amount_jod: line.converted_amount_jod,
                    description: line.description.clone(),
                }
            })
            .collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountType};
    use crate::ledger::types::JournalLineInput;
    use chrono::NaiveDate;
    use daftar_shared::types::{AccountId, Currency};
    use rust_decimal_macros::dec;

    fn leaf(code: &str, account_type: AccountType) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            code: code.into(),
            name: format!("Account {code}"),
            account_type,
            parent_id: None,
            is_parent: false,
            currency: Currency::Jod,
            normal_balance: account_type.normal_balance(),
            opening_balance: Decimal::ZERO,
            opening_balance_type: None,
            current_balance: Decimal::ZERO,
            has_transactions: false,
            created_by: "admin".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn input(lines: Vec<JournalLineInput>) -> JournalEntryInput {
        JournalEntryInput {
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            description: "  Office rent  ".into(),
            reference: Some("   ".into()),
            lines,
            created_by: "accountant".into(),
        }
    }

    #[test]
    fn test_prepare_converts_usdt_lines() {
        let (wallet, equity) = (AccountId::new(), AccountId::new());
        let prepared = JournalService::prepare(
            &input(vec![
                JournalLineInput::debit(wallet, dec!(50.00), Currency::Usdt),
                JournalLineInput::credit(equity, dec!(50.00), Currency::Usdt),
            ]),
            dec!(0.71),
        )
        .unwrap();

        assert_eq!(prepared.lines[0].converted_amount_jod, dec!(35.50));
        assert_eq!(prepared.lines[0].exchange_rate, dec!(0.71));
        assert_eq!(prepared.totals.total_debits_usdt, dec!(50.00));
        assert_eq!(prepared.description, "Office rent");
        assert!(prepared.reference.is_none());
    }

    #[test]
    fn test_prepare_rejects_blank_description() {
        let mut bad = input(vec![]);
        bad.description = "   ".into();
        assert!(matches!(
            JournalService::prepare(&bad, dec!(0.71)),
            Err(LedgerError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_create_edit_void_cycle() {
        let cash = leaf("1001", AccountType::Asset);
        let sales = leaf("4001", AccountType::Revenue);
        let (cash_id, sales_id) = (cash.id, sales.id);
        let mut book = AccountBook::from_accounts([cash, sales]);
        let now = Utc::now();

        let prepared = JournalService::prepare(
            &input(vec![
                JournalLineInput::debit(cash_id, dec!(100.00), Currency::Jod),
                JournalLineInput::credit(sales_id, dec!(100.00), Currency::Jod),
            ]),
            dec!(0.71),
        )
        .unwrap();
        let posted = JournalService::create(&mut book, &prepared, 1, now).unwrap();
        assert_eq!(posted.entry.status, JournalStatus::Posted);
        assert_eq!(posted.entry.lines.len(), 2);
        assert_eq!(book.get(cash_id).unwrap().current_balance, dec!(100.00));

        let revised = JournalService::prepare(
            &input(vec![
                JournalLineInput::debit(cash_id, dec!(60.00), Currency::Jod),
                JournalLineInput::credit(sales_id, dec!(60.00), Currency::Jod),
            ]),
            dec!(0.71),
        )
        .unwrap();
        let edited =
            JournalService::edit(&mut book, &posted.entry, &posted.transactions, &revised, now)
                .unwrap();
        assert_eq!(edited.entry.entry_number, 1);
        assert_eq!(edited.entry.id, posted.entry.id);
        assert_eq!(book.get(cash_id).unwrap().current_balance, dec!(60.00));
        assert_eq!(book.get(sales_id).unwrap().current_balance, dec!(60.00));

        let voided =
            JournalService::void(&mut book, &edited.entry, &edited.transactions, now).unwrap();
        assert_eq!(voided.status, JournalStatus::Voided);
        assert_eq!(book.get(cash_id).unwrap().current_balance, Decimal::ZERO);
        assert_eq!(book.get(sales_id).unwrap().current_balance, Decimal::ZERO);

        assert!(matches!(
            JournalService::void(&mut book, &voided, &[], now),
            Err(LedgerError::AlreadyVoided(_))
        ));
        assert!(matches!(
            JournalService::edit(&mut book, &voided, &[], &revised, now),
            Err(LedgerError::AlreadyVoided(_))
        ));
    }
}
