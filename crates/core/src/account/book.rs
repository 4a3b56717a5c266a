//! Arena of accounts keyed by id.
//!
//! The book is the working set a ledger operation mutates. It keeps a
//! children index next to the accounts and records which accounts were
//! inserted, updated, or removed so a store can persist exactly those rows.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use daftar_shared::types::AccountId;
use rust_decimal::Decimal;

use super::types::Account;
use crate::ledger::LedgerError;

/// Accounts touched since the book was loaded or last drained.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    /// Newly created accounts.
    pub inserted: Vec<Account>,
    /// Existing accounts whose fields changed.
    pub updated: Vec<Account>,
    /// Accounts deleted from the book.
    pub removed: Vec<AccountId>,
}

impl BookChanges {
    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// In-memory account arena with a parent/children index.
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    accounts: HashMap<AccountId, Account>,
    children: HashMap<AccountId, Vec<AccountId>>,
    inserted: HashSet<AccountId>,
    dirty: HashSet<AccountId>,
    removed: HashSet<AccountId>,
}

impl AccountBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads existing accounts. Loaded accounts are not reported as changes.
    #[must_use]
    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut book = Self::new();
        for account in accounts {
            book.index(&account);
            book.accounts.insert(account.id, account);
        }
        book
    }

    fn index(&mut self, account: &Account) {
        if let Some(parent_id) = account.parent_id {
            self.children.entry(parent_id).or_default().push(account.id);
        }
    }

    /// Number of accounts in the book.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the book holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Looks up an account that must exist.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the id is unknown.
    pub fn require(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts.get(&id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Iterates over all accounts in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Iterates over the direct children of `id`.
    pub fn children_of(&self, id: AccountId) -> impl Iterator<Item = &Account> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.accounts.get(child))
    }

    /// Returns true if `id` has at least one child.
    #[must_use]
    pub fn has_children(&self, id: AccountId) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    /// Numeric codes currently in use.
    #[must_use]
    pub fn codes_in_use(&self) -> HashSet<u32> {
        self.accounts.values().filter_map(Account::code_number).collect()
    }

    /// Returns `start` followed by each existing ancestor, nearest first.
    ///
    /// The walk stops at the first account without a parent or whose parent
    /// is not in the book.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if `start` is unknown and
    /// `LedgerError::Internal` if the parent links form a cycle.
    pub fn ancestor_chain(&self, start: AccountId) -> Result<Vec<AccountId>, LedgerError> {
        let mut chain = vec![self.require(start)?.id];
        let mut seen: HashSet<AccountId> = HashSet::from([start]);
        let mut current = self.accounts.get(&start).and_then(|a| a.parent_id);

        while let Some(id) = current {
            let Some(account) = self.accounts.get(&id) else {
                break;
            };
            if !seen.insert(id) {
                return Err(LedgerError::Internal(format!(
                    "account hierarchy contains a cycle at {id}"
                )));
            }
            chain.push(id);
            current = account.parent_id;
        }

        Ok(chain)
    }

    /// Adds a new account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if the id is already present.
    pub fn insert(&mut self, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&account.id) {
            return Err(LedgerError::Internal(format!(
                "account {} already exists",
                account.id
            )));
        }

        self.index(&account);
        self.removed.remove(&account.id);
        self.inserted.insert(account.id);
        self.accounts.insert(account.id, account);
        Ok(())
    }

    /// Removes an account and unlinks it from its parent.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the id is unknown.
    pub fn remove(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self
            .accounts
            .remove(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;

        if let Some(siblings) = account.parent_id.and_then(|p| self.children.get_mut(&p)) {
            siblings.retain(|child| *child != id);
        }
        self.children.remove(&id);
        self.dirty.remove(&id);
        if !self.inserted.remove(&id) {
            self.removed.insert(id);
        }

        Ok(account)
    }

    /// Applies `change` to an account and marks it updated.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the id is unknown.
    pub fn update<F>(&mut self, id: AccountId, now: DateTime<Utc>, change: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut Account),
    {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        change(account);
        account.updated_at = now;
        self.mark_dirty(id);
        Ok(())
    }

    /// Writes a new running balance; unchanged balances are not marked.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the id is unknown.
    pub fn set_balance(
        &mut self,
        id: AccountId,
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        if account.current_balance == balance {
            return Ok(());
        }
        account.current_balance = balance;
        account.updated_at = now;
        self.mark_dirty(id);
        Ok(())
    }

    fn mark_dirty(&mut self, id: AccountId) {
        if !self.inserted.contains(&id) {
            self.dirty.insert(id);
        }
    }

    /// Returns the pending changes without clearing them.
    #[must_use]
    pub fn changes(&self) -> BookChanges {
        let collect = |ids: &HashSet<AccountId>| {
            let mut accounts: Vec<Account> = ids
                .iter()
                .filter_map(|id| self.accounts.get(id).cloned())
                .collect();
            accounts.sort_by(|a, b| a.code.cmp(&b.code));
            accounts
        };

        BookChanges {
            inserted: collect(&self.inserted),
            updated: collect(&self.dirty),
            removed: self.removed.iter().copied().collect(),
        }
    }

    /// Returns the pending changes and starts tracking afresh.
    pub fn take_changes(&mut self) -> BookChanges {
        let changes = self.changes();
        self.inserted.clear();
        self.dirty.clear();
        self.removed.clear();
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountType, BalanceSide};
    use daftar_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn account(code: &str, is_parent: bool, parent_id: Option<AccountId>) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            code: code.into(),
            name: format!("Account {code}"),
            account_type: AccountType::Asset,
            parent_id,
            is_parent,
            currency: Currency::Jod,
            normal_balance: BalanceSide::Debit,
            opening_balance: Decimal::ZERO,
            opening_balance_type: None,
            current_balance: Decimal::ZERO,
            has_transactions: false,
            created_by: "admin".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_loaded_accounts_are_not_changes() {
        let root = account("1000", true, None);
        let book = AccountBook::from_accounts([root]);
        assert!(book.changes().is_empty());
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_children_index() {
        let root = account("1000", true, None);
        let child = account("1001", false, Some(root.id));
        let root_id = root.id;
        let book = AccountBook::from_accounts([root, child]);

        assert!(book.has_children(root_id));
        assert_eq!(book.children_of(root_id).count(), 1);
        assert_eq!(book.codes_in_use(), HashSet::from([1000, 1001]));
    }

    #[test]
    fn test_ancestor_chain_nearest_first() {
        let root = account("1000", true, None);
        let mid = account("1100", true, Some(root.id));
        let leaf = account("1101", false, Some(mid.id));
        let (root_id, mid_id, leaf_id) = (root.id, mid.id, leaf.id);
        let book = AccountBook::from_accounts([root, mid, leaf]);

        assert_eq!(book.ancestor_chain(leaf_id).unwrap(), vec![leaf_id, mid_id, root_id]);
        assert_eq!(book.ancestor_chain(root_id).unwrap(), vec![root_id]);
    }

    #[test]
    fn test_ancestor_chain_detects_cycle() {
        let mut a = account("1000", true, None);
        let b = account("1100", true, Some(a.id));
        a.parent_id = Some(b.id);
        let a_id = a.id;
        let book = AccountBook::from_accounts([a, b]);

        assert!(matches!(book.ancestor_chain(a_id), Err(LedgerError::Internal(_))));
    }

    #[test]
    fn test_change_tracking() {
        let root = account("1000", true, None);
        let root_id = root.id;
        let mut book = AccountBook::from_accounts([root]);
        let now = Utc::now();

        let child = account("1001", false, Some(root_id));
        let child_id = child.id;
        book.insert(child).unwrap();
        book.set_balance(child_id, dec!(10), now).unwrap();
        book.set_balance(root_id, dec!(10), now).unwrap();

        let changes = book.take_changes();
        assert_eq!(changes.inserted.len(), 1);
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(changes.updated[0].id, root_id);
        assert!(book.changes().is_empty());
    }

    #[test]
    fn test_unchanged_balance_not_marked() {
        let root = account("1000", true, None);
        let root_id = root.id;
        let mut book = AccountBook::from_accounts([root]);

        book.set_balance(root_id, Decimal::ZERO, Utc::now()).unwrap();
        assert!(book.changes().is_empty());
    }

    #[test]
    fn test_remove_unlinks_and_tracks() {
        let root = account("1000", true, None);
        let child = account("1001", false, Some(root.id));
        let (root_id, child_id) = (root.id, child.id);
        let mut book = AccountBook::from_accounts([root, child]);

        book.remove(child_id).unwrap();

        assert!(!book.has_children(root_id));
        assert_eq!(book.changes().removed, vec![child_id]);
        assert!(matches!(
            book.remove(child_id),
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_insert_then_remove_leaves_no_trace() {
        let mut book = AccountBook::new();
        let leaf = account("1001", false, None);
        let id = leaf.id;

        book.insert(leaf).unwrap();
        book.remove(id).unwrap();

        assert!(book.changes().is_empty());
    }
}
