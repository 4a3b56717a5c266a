//! Parent balance propagation.
//!
//! A parent account's balance is the sum of its direct children's balances.
//! After a leaf changes, every parent above it is recomputed nearest first.

use chrono::{DateTime, Utc};
use daftar_shared::types::{AccountId, checked_money_add};
use rust_decimal::Decimal;

use super::error::LedgerError;
use crate::account::AccountBook;

/// Recomputes parent balances from their children.
pub struct BalancePropagator;

impl BalancePropagator {
    /// Recomputes `parent_id` and each parent account above it.
    ///
    /// The walk stops at the root, at an account missing from the book, or
    /// at the first account that is not a parent account. Running it twice on
    /// an unchanged subtree yields the same balances.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if `parent_id` is unknown,
    /// `LedgerError::AmountOutOfRange` if a parent total leaves the storable
    /// range and `LedgerError::Internal` if the hierarchy contains a cycle.
    pub fn propagate(
        book: &mut AccountBook,
        parent_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        for id in book.ancestor_chain(parent_id)? {
            if !book.require(id)?.is_parent {
                break;
            }

            let total = book
                .children_of(id)
                .try_fold(Decimal::ZERO, |sum, c| checked_money_add(sum, c.current_balance))
                .ok_or_else(|| LedgerError::out_of_range(format!("balance of parent {id}")))?;
            book.set_balance(id, total, now)?;
        }

        Ok(())
    }

    /// Propagates from the parent of `account_id`, if it has one.
    ///
    /// # Errors
    ///
    /// Same as [`BalancePropagator::propagate`].
    pub fn propagate_above(
        book: &mut AccountBook,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let parent = book.require(account_id)?.parent_id;
        match parent {
            Some(parent_id) if book.get(parent_id).is_some() => {
                Self::propagate(book, parent_id, now)
            }
            _ => Ok(()),
        }
    }
}
