//! Chart of accounts rules: create, update, delete, read.

use chrono::{DateTime, Utc};
use daftar_shared::types::{AccountId, MAX_AMOUNT, round_money};
use rust_decimal::Decimal;

use super::book::AccountBook;
use super::code::allocate_code;
use super::types::{
    Account, AccountDetail, AccountFilter, CreateAccountInput, UpdateAccountInput,
};
use crate::ledger::{BalancePropagator, LedgerError};

/// Account directory operations over an [`AccountBook`].
pub struct AccountDirectory;

impl AccountDirectory {
    /// Creates an account with an auto-assigned code.
    ///
    /// A leaf starts at its opening balance, signed against its normal
    /// balance; parent accounts start at zero and never carry an opening
    /// balance. The parent chain is propagated afterwards.
    ///
    /// # Errors
    ///
    /// - `LedgerError::ConstraintViolation` for a blank name, a negative or
    ///   over-precise opening balance, or an invalid parent
    /// - `LedgerError::AccountNotFound` if the parent does not exist
    /// - `LedgerError::CodeSpaceExhausted` if no code is left
    /// - `LedgerError::AmountOutOfRange` if the opening balance is above
    ///   the largest line amount or a parent total would overflow
    pub fn create(
        book: &mut AccountBook,
        input: &CreateAccountInput,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let name = required_name(&input.name)?;

        let parent_code = match input.parent_id {
            Some(parent_id) => {
                let parent = book.require(parent_id)?;
                if !parent.is_parent {
                    return Err(LedgerError::constraint(format!(
                        "account {} is not a parent account",
                        parent.code
                    )));
                }
                if parent.account_type != input.account_type {
                    return Err(LedgerError::constraint(format!(
                        "parent account {} is {}, not {}",
                        parent.code, parent.account_type, input.account_type
                    )));
                }
                parent.code_number()
            }
            None => None,
        };

        let code = allocate_code(
            input.account_type,
            input.is_parent,
            parent_code,
            &book.codes_in_use(),
        )?;

        let normal_balance = input.account_type.normal_balance();
        let (opening_balance, opening_balance_type) = if input.is_parent {
            (Decimal::ZERO, None)
        } else {
            let amount = checked_opening_balance(input.opening_balance.unwrap_or_default())?;
            (amount, Some(input.opening_balance_type.unwrap_or(normal_balance)))
        };

        let mut account = Account {
            id: AccountId::new(),
            code: code.to_string(),
            name,
            account_type: input.account_type,
            parent_id: input.parent_id,
            is_parent: input.is_parent,
            currency: input.currency,
            normal_balance,
            opening_balance,
            opening_balance_type,
            current_balance: Decimal::ZERO,
            has_transactions: false,
            created_by: input.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        account.current_balance = account.signed_opening_balance();

        let id = account.id;
        book.insert(account)?;
        BalancePropagator::propagate_above(book, id, now)?;

        Ok(book.require(id)?.clone())
    }

    /// Updates name, currency, or opening balance.
    ///
    /// Opening balance fields are ignored on parent accounts. Changing a
    /// leaf's opening balance resets its running balance to the new signed
    /// opening balance and propagates the parent chain.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AccountNotFound` if the account does not exist
    /// - `LedgerError::ConstraintViolation` for a blank name, an invalid
    ///   opening balance, or an opening balance change after transactions
    /// - `LedgerError::AmountOutOfRange` for an opening balance above the
    ///   largest line amount
    pub fn update(
        book: &mut AccountBook,
        id: AccountId,
        input: &UpdateAccountInput,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let account = book.require(id)?;
        let touches_opening =
            input.opening_balance.is_some() || input.opening_balance_type.is_some();

        if touches_opening && account.has_transactions {
            return Err(LedgerError::constraint(format!(
                "opening balance of account {} is frozen once it has transactions",
                account.code
            )));
        }

        let name = input.name.as_deref().map(required_name).transpose()?;
        let opening_balance = input
            .opening_balance
            .map(checked_opening_balance)
            .transpose()?;
        let resets_opening = touches_opening && !account.is_parent;

        book.update(id, now, |a| {
            if let Some(name) = name {
                a.name = name;
            }
            if let Some(currency) = input.currency {
                a.currency = currency;
            }
            if resets_opening {
                if let Some(amount) = opening_balance {
                    a.opening_balance = amount;
                }
                if let Some(side) = input.opening_balance_type {
                    a.opening_balance_type = Some(side);
                }
                a.current_balance = a.signed_opening_balance();
            }
        })?;

        if resets_opening {
            BalancePropagator::propagate_above(book, id, now)?;
        }

        Ok(book.require(id)?.clone())
    }

    /// Deletes an account without transactions or children.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AccountNotFound` if the account does not exist
    /// - `LedgerError::ConstraintViolation` if it has transactions or children
    pub fn delete(
        book: &mut AccountBook,
        id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let account = book.require(id)?;
        if account.has_transactions {
            return Err(LedgerError::constraint(format!(
                "account {} has transactions and cannot be deleted",
                account.code
            )));
        }
        if book.has_children(id) {
            return Err(LedgerError::constraint(format!(
                "account {} has child accounts and cannot be deleted",
                account.code
            )));
        }

        let removed = book.remove(id)?;
        if let Some(parent_id) = removed.parent_id.filter(|p| book.get(*p).is_some()) {
            BalancePropagator::propagate(book, parent_id, now)?;
        }

        Ok(removed)
    }

    /// Returns an account with its parent and children ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the account does not exist.
    pub fn detail(book: &AccountBook, id: AccountId) -> Result<AccountDetail, LedgerError> {
        let account = book.require(id)?.clone();
        let parent = account.parent_id.and_then(|p| book.get(p)).cloned();
        let mut children: Vec<Account> = book.children_of(id).cloned().collect();
        children.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(AccountDetail {
            account,
            parent,
            children,
        })
    }

    /// Lists accounts matching `filter`, ordered by type then code.
    #[must_use]
    pub fn list(book: &AccountBook, filter: &AccountFilter) -> Vec<Account> {
        let mut accounts: Vec<Account> = book
            .accounts()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| {
            a.account_type
                .cmp(&b.account_type)
                .then_with(|| a.code.cmp(&b.code))
        });
        accounts
    }
}

fn required_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::constraint("account name is required"));
    }
    Ok(trimmed.to_string())
}

fn checked_opening_balance(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::constraint("opening balance cannot be negative"));
    }
    if round_money(amount) != amount {
        return Err(LedgerError::constraint(
            "opening balance cannot have more than two decimal places",
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::out_of_range(format!(
            "opening balance cannot exceed {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}
