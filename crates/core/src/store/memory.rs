//! In-process ledger store.
//!
//! One `RwLock` guards the whole ledger state, so writers are serialized.
//! A mutation works on a copy of the account book (made on first use) and
//! stages its entry, transaction and rate records; they are applied only
//! when the operation succeeds, so a failed operation leaves nothing
//! behind. Readers never see a half-applied operation.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::Utc;
use daftar_shared::config::LedgerConfig;
use daftar_shared::types::{AccountId, JournalEntryId, PageResponse};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::account::{
    Account, AccountBook, AccountDetail, AccountDirectory, AccountFilter, AccountListCache,
    CreateAccountInput, TreeNode, UpdateAccountInput, build_tree,
};
use crate::currency::ExchangeRate;
use crate::ledger::{
    JournalEntry, JournalEntryInput, JournalFilter, JournalService, LedgerError,
    LedgerTransaction, PostedEntry, VoidOutcome,
};

/// Who is recorded when the default exchange rate is created on first read.
pub const SYSTEM_USER: &str = "system";

#[derive(Debug, Default)]
struct LedgerState {
    book: AccountBook,
    entries: HashMap<JournalEntryId, JournalEntry>,
    transactions: HashMap<JournalEntryId, Vec<LedgerTransaction>>,
    exchange_rate: Option<ExchangeRate>,
    last_entry_number: i64,
}

impl LedgerState {
    fn next_entry_number(&self) -> i64 {
        self.last_entry_number + 1
    }

    fn entry(&self, id: JournalEntryId) -> Result<&JournalEntry, LedgerError> {
        self.entries.get(&id).ok_or(LedgerError::JournalEntryNotFound(id))
    }

    fn transactions_of(&self, id: JournalEntryId) -> &[LedgerTransaction] {
        self.transactions.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Applies staged writes; returns true if any account changed.
    fn apply(&mut self, staged: Staged) -> bool {
        let mut accounts_changed = false;
        if let Some(mut book) = staged.book {
            accounts_changed = !book.take_changes().is_empty();
            self.book = book;
        }
        if let Some((id, transactions)) = staged.transactions {
            if transactions.is_empty() {
                self.transactions.remove(&id);
            } else {
                self.transactions.insert(id, transactions);
            }
        }
        if let Some(entry) = staged.entry {
            self.last_entry_number = self.last_entry_number.max(entry.entry_number);
            self.entries.insert(entry.id, entry);
        }
        if let Some(rate) = staged.exchange_rate {
            self.exchange_rate = Some(rate);
        }
        accounts_changed
    }
}

/// One operation's view of the ledger: the committed state, read-only, plus
/// the writes it stages.
struct UnitOfWork<'a> {
    committed: &'a LedgerState,
    book: Cow<'a, AccountBook>,
    staged: Staged,
}

/// Writes staged by a [`UnitOfWork`]. An empty transaction list removes
/// the entry's rows.
#[derive(Default)]
struct Staged {
    book: Option<AccountBook>,
    entry: Option<JournalEntry>,
    transactions: Option<(JournalEntryId, Vec<LedgerTransaction>)>,
    exchange_rate: Option<ExchangeRate>,
}

impl<'a> UnitOfWork<'a> {
    fn new(committed: &'a LedgerState) -> Self {
        Self {
            committed,
            book: Cow::Borrowed(&committed.book),
            staged: Staged::default(),
        }
    }

    /// The working account book, copied from the committed one on first use.
    fn book(&mut self) -> &mut AccountBook {
        self.book.to_mut()
    }

    /// Stages an entry and replaces its transaction rows.
    fn record(&mut self, entry: JournalEntry, transactions: Vec<LedgerTransaction>) {
        self.staged.transactions = Some((entry.id, transactions));
        self.staged.entry = Some(entry);
    }

    fn finish(self) -> Staged {
        let book = match self.book {
            Cow::Owned(book) => Some(book),
            Cow::Borrowed(_) => None,
        };
        Staged { book, ..self.staged }
    }
}

/// Ledger store kept in memory.
///
/// Thread-safe; share it behind an `Arc`.
#[derive(Debug)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    cache: AccountListCache,
    default_rate: Decimal,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            cache: AccountListCache::with_config(
                config.account_cache_capacity,
                config.account_cache_ttl_secs,
            ),
            default_rate: config.default_exchange_rate,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.state
            .read()
            .map_err(|_| LedgerError::Internal("ledger state lock poisoned".into()))
    }

    /// Runs `op` as one unit of work under the write lock.
    fn transact<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T, LedgerError>,
    {
        let mut guard = self
            .state
            .write()
            .map_err(|_| LedgerError::Internal("ledger state lock poisoned".into()))?;

        let mut uow = UnitOfWork::new(&guard);
        let value = op(&mut uow)?;
        let staged = uow.finish();
        let accounts_changed = guard.apply(staged);
        drop(guard);

        if accounts_changed {
            self.cache.invalidate_all();
        }
        Ok(value)
    }

    // ========== Accounts ==========

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::create`].
    pub fn create_account(&self, input: &CreateAccountInput) -> Result<Account, LedgerError> {
        let account = self.transact(|uow| AccountDirectory::create(uow.book(), input, Utc::now()))?;
        info!(account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::update`].
    pub fn update_account(
        &self,
        id: AccountId,
        input: &UpdateAccountInput,
    ) -> Result<Account, LedgerError> {
        let account =
            self.transact(|uow| AccountDirectory::update(uow.book(), id, input, Utc::now()))?;
        info!(account_id = %id, "Account updated");
        Ok(account)
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::delete`].
    pub fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let removed = self.transact(|uow| AccountDirectory::delete(uow.book(), id, Utc::now()))?;
        info!(account_id = %id, code = %removed.code, "Account deleted");
        Ok(())
    }

    /// Returns an account with its parent and children.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the account does not exist.
    pub fn get_account(&self, id: AccountId) -> Result<AccountDetail, LedgerError> {
        AccountDirectory::detail(&self.read()?.book, id)
    }

    /// Lists accounts through the listing cache.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if the state lock is poisoned.
    pub fn list_accounts(&self, filter: AccountFilter) -> Result<Arc<Vec<Account>>, LedgerError> {
        self.cache
            .get_or_load(filter, || Ok(AccountDirectory::list(&self.read()?.book, &filter)))
    }

    /// Builds the account forest from the cached full listing.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if the state lock is poisoned.
    pub fn account_tree(&self) -> Result<Vec<TreeNode>, LedgerError> {
        let accounts = self.list_accounts(AccountFilter::default())?;
        Ok(build_tree(&accounts))
    }

    // ========== Exchange rate ==========

    /// Returns the exchange rate, storing the configured default first if
    /// none exists yet.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidExchangeRate` if the configured default
    /// is not positive.
    pub fn get_rate(&self) -> Result<ExchangeRate, LedgerError> {
        if let Some(rate) = self.read()?.exchange_rate.clone() {
            return Ok(rate);
        }

        self.transact(|uow| {
            if let Some(rate) = &uow.committed.exchange_rate {
                return Ok(rate.clone());
            }
            let rate = ExchangeRate::new(self.default_rate, SYSTEM_USER, Utc::now())?;
            uow.staged.exchange_rate = Some(rate.clone());
            Ok(rate)
        })
    }

    /// Replaces the exchange rate.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidExchangeRate` unless `rate > 0`.
    pub fn set_rate(&self, rate: Decimal, updated_by: &str) -> Result<ExchangeRate, LedgerError> {
        let stored = self.transact(|uow| {
            let now = Utc::now();
            let stored = match uow.committed.exchange_rate.clone() {
                Some(mut existing) => {
                    existing.set(rate, updated_by, now)?;
                    existing
                }
                None => ExchangeRate::new(rate, updated_by, now)?,
            };
            uow.staged.exchange_rate = Some(stored.clone());
            Ok(stored)
        })?;
        info!(rate = %stored.rate, updated_by = %stored.updated_by, "Exchange rate updated");
        Ok(stored)
    }

    // ========== Journal entries ==========

    /// Validates and posts a new journal entry at the current rate.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before anything is written; posting
    /// errors roll the whole operation back.
    pub fn create_entry(&self, input: &JournalEntryInput) -> Result<JournalEntry, LedgerError> {
        let rate = self.get_rate()?.rate;
        let prepared = JournalService::prepare(input, rate).inspect_err(|e| {
            warn!(error = %e, "Journal entry rejected");
        })?;

        let entry = self.transact(|uow| {
            let number = uow.committed.next_entry_number();
            let posted = JournalService::create(uow.book(), &prepared, number, Utc::now())?;
            uow.record(posted.entry.clone(), posted.transactions);
            Ok(posted.entry)
        })?;

        info!(
            entry_id = %entry.id,
            entry_number = entry.entry_number,
            lines = entry.lines.len(),
            "Journal entry created"
        );
        Ok(entry)
    }

    /// Replaces a posted entry's content and re-posts it at the current rate.
    ///
    /// # Errors
    ///
    /// - validation errors before anything is written
    /// - `LedgerError::JournalEntryNotFound` / `LedgerError::AlreadyVoided`
    /// - posting errors, which roll the whole operation back
    pub fn edit_entry(
        &self,
        id: JournalEntryId,
        input: &JournalEntryInput,
    ) -> Result<JournalEntry, LedgerError> {
        let rate = self.get_rate()?.rate;
        let prepared = JournalService::prepare(input, rate)?;

        let entry = self.transact(|uow| {
            let committed = uow.committed;
            let existing = committed.entry(id)?;
            let old = committed.transactions_of(id);
            let posted = JournalService::edit(uow.book(), existing, old, &prepared, Utc::now())?;
            uow.record(posted.entry.clone(), posted.transactions);
            Ok(posted.entry)
        })?;

        info!(
            entry_id = %entry.id,
            entry_number = entry.entry_number,
            lines = entry.lines.len(),
            "Journal entry edited"
        );
        Ok(entry)
    }

    /// Voids a posted entry; its transaction rows are deleted while the entry
    /// and its lines remain.
    ///
    /// # Errors
    ///
    /// `LedgerError::JournalEntryNotFound` or `LedgerError::AlreadyVoided`.
    pub fn void_entry(&self, id: JournalEntryId) -> Result<VoidOutcome, LedgerError> {
        let entry = self.transact(|uow| {
            let committed = uow.committed;
            let existing = committed.entry(id)?;
            let old = committed.transactions_of(id);
            let voided = JournalService::void(uow.book(), existing, old, Utc::now())?;
            uow.record(voided.clone(), Vec::new());
            Ok(voided)
        })?;

        info!(entry_id = %entry.id, entry_number = entry.entry_number, "Journal entry voided");
        Ok(VoidOutcome { success: true })
    }

    /// Returns an entry with its live transaction rows in posting order.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::JournalEntryNotFound` if the entry does not exist.
    pub fn get_entry(&self, id: JournalEntryId) -> Result<PostedEntry, LedgerError> {
        let state = self.read()?;
        let entry = state.entry(id)?.clone();
        let mut transactions = state.transactions_of(id).to_vec();
        transactions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        Ok(PostedEntry {
            entry,
            transactions,
        })
    }

    /// Lists entries newest first (date, then number), one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if the state lock is poisoned.
    pub fn list_entries(
        &self,
        filter: &JournalFilter,
    ) -> Result<PageResponse<JournalEntry>, LedgerError> {
        let state = self.read()?;
        let mut matching: Vec<&JournalEntry> =
            state.entries.values().filter(|e| filter.matches(e)).collect();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.entry_number.cmp(&a.entry_number))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(filter.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.page.limit()).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(PageResponse::new(data, filter.page, total))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}
