//! Posting journal lines to accounts and reversing them.
//!
//! Posting is incremental: a leaf balance moves by the signed line amount
//! from its previous value and is never recomputed from history. Reversal
//! undoes recorded transaction rows using their own type and amount, so it
//! stays correct when unrelated postings hit the same accounts in between.

use chrono::{DateTime, NaiveDate, Utc};
use daftar_shared::types::{JournalEntryId, LedgerTransactionId, checked_money_add};
use tracing::debug;

use super::balance::BalancePropagator;
use super::error::LedgerError;
use super::types::{JournalEntryLine, LedgerTransaction};
use crate::account::AccountBook;

/// Applies journal lines to an account book.
pub struct TransactionPoster;

impl TransactionPoster {
    /// Posts every line of an entry and returns one transaction per line.
    ///
    /// For each line the target leaf account moves by the line amount
    /// (added when the line side matches the account's normal balance,
    /// subtracted otherwise), `has_transactions` is set, and the parent
    /// chain is propagated.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AccountNotFound` if a line targets an unknown account
    /// - `LedgerError::ConstraintViolation` if a line targets a parent account
    /// - `LedgerError::AmountOutOfRange` if a balance would leave the
    ///   storable range
    ///
    /// The book may be partially modified on error; callers discard it.
    pub fn post(
        book: &mut AccountBook,
        entry_id: JournalEntryId,
        date: NaiveDate,
        lines: &[JournalEntryLine],
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerTransaction>, LedgerError> {
        let mut transactions = Vec::with_capacity(lines.len());

        for (sequence, line) in (0_i32..).zip(lines) {
            let account = book.require(line.account_id)?;
            if account.is_parent {
                return Err(LedgerError::constraint(format!(
                    "account {} is a parent account and cannot receive postings",
                    account.code
                )));
            }

            let (side, amount) = line.side_amount();
            let before = account.current_balance;
            let after = checked_money_add(before, account.normal_balance.effect(side, amount))
                .ok_or_else(|| {
                    LedgerError::out_of_range(format!("balance of account {}", account.code))
                })?;

            book.update(line.account_id, now, |a| {
                a.current_balance = after;
                a.has_transactions = true;
            })?;
            BalancePropagator::propagate_above(book, line.account_id, now)?;

            debug!(
                account_id = %line.account_id,
                side = %side,
                amount = %amount,
                balance_after = %after,
                "posted line"
            );

            transactions.push(LedgerTransaction {
                id: LedgerTransactionId::new(),
                journal_entry_id: entry_id,
                account_id: line.account_id,
                amount,
                transaction_type: side,
                currency: line.currency,
                exchange_rate: line.exchange_rate,
                balance_before: before,
                balance_after: after,
                date,
                description: line.description.clone(),
                sequence,
                created_at: now,
            });
        }

        Ok(transactions)
    }

    /// Undoes previously posted transactions, most recent first.
    ///
    /// Each row is inverted with its recorded type and amount against the
    /// account's normal balance, then the parent chain is propagated. The
    /// caller deletes the rows afterwards.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if a row's account is gone, or
    /// `LedgerError::AmountOutOfRange` if a restored balance would leave the
    /// storable range.
    pub fn reverse(
        book: &mut AccountBook,
        transactions: &[LedgerTransaction],
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut ordered: Vec<&LedgerTransaction> = transactions.iter().collect();
        ordered.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });

        for txn in ordered {
            let account = book.require(txn.account_id)?;
            let restored = checked_money_add(
                account.current_balance,
                -account.normal_balance.effect(txn.transaction_type, txn.amount),
            )
            .ok_or_else(|| {
                LedgerError::out_of_range(format!("balance of account {}", account.code))
            })?;

            book.set_balance(txn.account_id, restored, now)?;
            BalancePropagator::propagate_above(book, txn.account_id, now)?;

            debug!(
                account_id = %txn.account_id,
                transaction_id = %txn.id,
                balance_after = %restored,
                "reversed transaction"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountType, BalanceSide};
    use daftar_shared::types::{AccountId, Currency, JournalLineId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn account(
        code: &str,
        account_type: AccountType,
        is_parent: bool,
        parent_id: Option<AccountId>,
    ) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            code: code.into(),
            name: format!("Account {code}"),
            account_type,
            parent_id,
            is_parent,
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

    fn line(account_id: AccountId, side: BalanceSide, amount: Decimal) -> JournalEntryLine {
        let (debit_amount, credit_amount) = match side {
            BalanceSide::Debit => (amount, Decimal::ZERO),
            BalanceSide::Credit => (Decimal::ZERO, amount),
        };
        JournalEntryLine {
            id: JournalLineId::new(),
            journal_entry_id: JournalEntryId::new(),
            position: 0,
            account_id,
            debit_amount,
            credit_amount,
            currency: Currency::Jod,
            exchange_rate: dec!(0.71),
            converted_amount_jod: amount,
            description: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    struct Fixture {
        book: AccountBook,
        assets: AccountId,
        cash: AccountId,
        revenue: AccountId,
    }

    fn fixture() -> Fixture {
        let assets = account("1000", AccountType::Asset, true, None);
        let cash = account("1001", AccountType::Asset, false, Some(assets.id));
        let revenue = account("4001", AccountType::Revenue, false, None);
        let (a, c, r) = (assets.id, cash.id, revenue.id);
        Fixture {
            book: AccountBook::from_accounts([assets, cash, revenue]),
            assets: a,
            cash: c,
            revenue: r,
        }
    }

    #[test]
    fn test_post_moves_balances_by_normal_side() {
        let mut f = fixture();
        let lines = vec![
            line(f.cash, BalanceSide::Debit, dec!(100.00)),
            line(f.revenue, BalanceSide::Credit, dec!(100.00)),
        ];

        let txns =
            TransactionPoster::post(&mut f.book, JournalEntryId::new(), today(), &lines, Utc::now())
                .unwrap();

        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].balance_before, Decimal::ZERO);
        assert_eq!(txns[0].balance_after, dec!(100.00));
        assert_eq!(txns[1].sequence, 1);
        assert_eq!(f.book.get(f.cash).unwrap().current_balance, dec!(100.00));
        assert_eq!(f.book.get(f.revenue).unwrap().current_balance, dec!(100.00));
        assert_eq!(f.book.get(f.assets).unwrap().current_balance, dec!(100.00));
        assert!(f.book.get(f.cash).unwrap().has_transactions);
    }

    #[test]
    fn test_opposite_side_subtracts() {
        let mut f = fixture();
        let lines = vec![line(f.cash, BalanceSide::Credit, dec!(40))];

        TransactionPoster::post(&mut f.book, JournalEntryId::new(), today(), &lines, Utc::now())
            .unwrap();

        assert_eq!(f.book.get(f.cash).unwrap().current_balance, dec!(-40));
        assert_eq!(f.book.get(f.assets).unwrap().current_balance, dec!(-40));
    }

    #[test]
    fn test_parent_account_rejected() {
        let mut f = fixture();
        let lines = vec![line(f.assets, BalanceSide::Debit, dec!(10))];

        let err =
            TransactionPoster::post(&mut f.book, JournalEntryId::new(), today(), &lines, Utc::now())
                .unwrap_err();

        assert!(matches!(err, LedgerError::ConstraintViolation(_)));
    }

    #[test]
    fn test_unknown_account_rejected() {
        let mut f = fixture();
        let lines = vec![line(AccountId::new(), BalanceSide::Debit, dec!(10))];

        let err =
            TransactionPoster::post(&mut f.book, JournalEntryId::new(), today(), &lines, Utc::now())
                .unwrap_err();

        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }

    #[test]
    fn test_reverse_restores_balances() {
        let mut f = fixture();
        let lines = vec![
            line(f.cash, BalanceSide::Debit, dec!(75.25)),
            line(f.revenue, BalanceSide::Credit, dec!(75.25)),
        ];
        let now = Utc::now();
        let txns =
            TransactionPoster::post(&mut f.book, JournalEntryId::new(), today(), &lines, now).unwrap();

        TransactionPoster::reverse(&mut f.book, &txns, now).unwrap();

        for id in [f.cash, f.revenue, f.assets] {
            assert_eq!(f.book.get(id).unwrap().current_balance, Decimal::ZERO);
        }
    }

    #[test]
    fn test_reverse_survives_interleaved_postings() {
        let mut f = fixture();
        let now = Utc::now();
        let first = TransactionPoster::post(
            &mut f.book,
            JournalEntryId::new(),
            today(),
            &[
                line(f.cash, BalanceSide::Debit, dec!(30)),
                line(f.revenue, BalanceSide::Credit, dec!(30)),
            ],
            now,
        )
        .unwrap();
        TransactionPoster::post(
            &mut f.book,
            JournalEntryId::new(),
            today(),
            &[
                line(f.cash, BalanceSide::Debit, dec!(12)),
                line(f.revenue, BalanceSide::Credit, dec!(12)),
            ],
            now,
        )
        .unwrap();

        TransactionPoster::reverse(&mut f.book, &first, now).unwrap();

        assert_eq!(f.book.get(f.cash).unwrap().current_balance, dec!(12));
        assert_eq!(f.book.get(f.revenue).unwrap().current_balance, dec!(12));
        assert_eq!(f.book.get(f.assets).unwrap().current_balance, dec!(12));
    }

    #[test]
    fn test_reverse_missing_account() {
        let mut f = fixture();
        let now = Utc::now();
        let txns = TransactionPoster::post(
            &mut f.book,
            JournalEntryId::new(),
            today(),
            &[line(f.revenue, BalanceSide::Credit, dec!(1))],
            now,
        )
        .unwrap();
        let mut empty = AccountBook::new();

        assert!(matches!(
            TransactionPoster::reverse(&mut empty, &txns, now),
            Err(LedgerError::AccountNotFound(_))
        ));
    }
}
