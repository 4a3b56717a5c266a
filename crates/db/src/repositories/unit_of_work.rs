//! Serializable unit of work around the account arena.
//!
//! Every mutating ledger operation follows the same shape: begin a
//! SERIALIZABLE transaction, load and lock the whole chart, let the engine
//! change the in-memory [`AccountBook`], write back exactly what it changed,
//! then commit. Dropping the transaction on any error rolls everything back.

use daftar_core::LedgerError;
use daftar_core::account::{Account, AccountBook};
use daftar_shared::types::AccountId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IsolationLevel, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use super::error::db_err;
use crate::entities::accounts;

/// Opens a SERIALIZABLE transaction.
pub(crate) async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction, LedgerError> {
    db.begin_with_config(Some(IsolationLevel::Serializable), None)
        .await
        .map_err(db_err)
}

/// Loads every account with `SELECT ... FOR UPDATE`.
pub(crate) async fn load_book(txn: &DatabaseTransaction) -> Result<AccountBook, LedgerError> {
    let rows = accounts::Entity::find()
        .order_by_asc(accounts::Column::Code)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(db_err)?;

    Ok(AccountBook::from_accounts(rows.into_iter().map(Account::from)))
}

/// Writes back the accounts the engine inserted, changed or removed.
pub(crate) async fn persist_book(
    txn: &DatabaseTransaction,
    book: &mut AccountBook,
) -> Result<(), LedgerError> {
    let changes = book.take_changes();

    // Sorted by code, so a new parent is written before its new children.
    for account in &changes.inserted {
        accounts::ActiveModel::from(account)
            .insert(txn)
            .await
            .map_err(db_err)?;
    }

    for account in &changes.updated {
        accounts::ActiveModel::from(account)
            .update(txn)
            .await
            .map_err(db_err)?;
    }

    if !changes.removed.is_empty() {
        accounts::Entity::delete_many()
            .filter(
                accounts::Column::Id.is_in(changes.removed.iter().copied().map(AccountId::into_inner)),
            )
            .exec(txn)
            .await
            .map_err(db_err)?;
    }

    Ok(())
}

/// Commits a unit of work.
pub(crate) async fn commit(txn: DatabaseTransaction) -> Result<(), LedgerError> {
    txn.commit().await.map_err(db_err)
}
