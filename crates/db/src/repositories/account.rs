//! Account repository for chart of accounts database operations.
//!
//! Mutations run the account directory rules on the locked chart inside one
//! serializable transaction; listings are served through the shared
//! [`AccountListCache`].

use std::sync::Arc;

use chrono::Utc;
use daftar_core::LedgerError;
use daftar_core::account::{
    Account, AccountBook, AccountDetail, AccountDirectory, AccountFilter, AccountListCache,
    CreateAccountInput, TreeNode, UpdateAccountInput, build_tree,
};
use daftar_shared::types::AccountId;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::info;

use super::error::db_err;
use super::unit_of_work::{begin, commit, load_book, persist_book};
use crate::entities::accounts;

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    cache: AccountListCache,
}

impl AccountRepository {
    /// Creates a repository. Pass the same cache to the
    /// [`JournalRepository`](super::JournalRepository) so postings
    /// invalidate listings too.
    #[must_use]
    pub const fn new(db: DatabaseConnection, cache: AccountListCache) -> Self {
        Self { db, cache }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::create`]; storage errors otherwise.
    #[tracing::instrument(skip(self, input), fields(name = %input.name, account_type = %input.account_type))]
    pub async fn create(&self, input: &CreateAccountInput) -> Result<Account, LedgerError> {
        let txn = begin(&self.db).await?;
        let mut book = load_book(&txn).await?;

        let account = AccountDirectory::create(&mut book, input, Utc::now())?;

        persist_book(&txn, &mut book).await?;
        commit(txn).await?;
        self.cache.invalidate_all();

        info!(account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::update`]; storage errors otherwise.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: AccountId,
        input: &UpdateAccountInput,
    ) -> Result<Account, LedgerError> {
        let txn = begin(&self.db).await?;
        let mut book = load_book(&txn).await?;

        let account = AccountDirectory::update(&mut book, id, input, Utc::now())?;

        persist_book(&txn, &mut book).await?;
        commit(txn).await?;
        self.cache.invalidate_all();

        info!(account_id = %id, "Account updated");
        Ok(account)
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::delete`]; storage errors otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: AccountId) -> Result<(), LedgerError> {
        let txn = begin(&self.db).await?;
        let mut book = load_book(&txn).await?;

        let removed = AccountDirectory::delete(&mut book, id, Utc::now())?;

        persist_book(&txn, &mut book).await?;
        commit(txn).await?;
        self.cache.invalidate_all();

        info!(account_id = %id, code = %removed.code, "Account deleted");
        Ok(())
    }

    /// Returns an account with its parent and children.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the account does not exist.
    pub async fn get(&self, id: AccountId) -> Result<AccountDetail, LedgerError> {
        AccountDirectory::detail(&self.snapshot().await?, id)
    }

    /// Lists accounts ordered by type then code, through the cache.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn list(&self, filter: AccountFilter) -> Result<Arc<Vec<Account>>, LedgerError> {
        if let Some(cached) = self.cache.get(&filter) {
            return Ok(cached);
        }

        let generation = self.cache.generation();
        let accounts = AccountDirectory::list(&self.snapshot().await?, &filter);
        Ok(self.cache.insert(filter, accounts, generation))
    }

    /// Builds the account forest.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn tree(&self) -> Result<Vec<TreeNode>, LedgerError> {
        let accounts = self.list(AccountFilter::default()).await?;
        Ok(build_tree(&accounts))
    }

    /// Reads the whole chart without locking.
    async fn snapshot(&self) -> Result<AccountBook, LedgerError> {
        let rows = accounts::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(AccountBook::from_accounts(rows.into_iter().map(Account::from)))
    }
}
