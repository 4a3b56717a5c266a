//! Journal repository: the entry lifecycle on PostgreSQL.
//!
//! Validation and rate conversion happen before a transaction is opened.
//! Everything after that, from entry number allocation through balance
//! write-back, happens in one serializable transaction with the chart
//! locked; two creators racing for the same number hit the unique index and
//! one of them gets `ConcurrencyConflict`.

use std::collections::HashMap;

use chrono::Utc;
use daftar_core::LedgerError;
use daftar_core::account::AccountListCache;
use daftar_core::ledger::{
    JournalEntry, JournalEntryInput, JournalFilter, JournalService, LedgerTransaction,
    PostedEntry, VoidOutcome,
};
use daftar_shared::types::{JournalEntryId, PageResponse};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::convert::entry_from_rows;
use super::error::db_err;
use super::exchange_rate::ExchangeRateRepository;
use super::unit_of_work::{begin, commit, load_book, persist_book};
use crate::entities::sea_orm_active_enums::JournalStatus;
use crate::entities::{journal_entries, journal_lines, ledger_transactions};

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    rates: ExchangeRateRepository,
    cache: AccountListCache,
}

impl JournalRepository {
    /// Creates a repository sharing the account listing cache.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        rates: ExchangeRateRepository,
        cache: AccountListCache,
    ) -> Self {
        Self { db, rates, cache }
    }

    /// Validates and posts a new entry at the current rate.
    ///
    /// # Errors
    ///
    /// - validation errors, before any transaction is opened
    /// - posting errors (`AccountNotFound`, `ConstraintViolation`)
    /// - `LedgerError::ConcurrencyConflict` if a concurrent writer won
    #[tracing::instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn create(&self, input: &JournalEntryInput) -> Result<JournalEntry, LedgerError> {
        let rate = self.rates.current().await?.rate;
        let prepared = JournalService::prepare(input, rate).inspect_err(|e| {
            warn!(error = %e, "Journal entry rejected");
        })?;

        let txn = begin(&self.db).await?;
        let mut book = load_book(&txn).await?;
        let number = next_entry_number(&txn).await?;

        let posted = JournalService::create(&mut book, &prepared, number, Utc::now())?;

        journal_entries::ActiveModel::from(&posted.entry)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        insert_lines(&txn, &posted.entry).await?;
        insert_transactions(&txn, &posted.transactions).await?;
        persist_book(&txn, &mut book).await?;
        commit(txn).await?;
        self.cache.invalidate_all();

        info!(
            entry_id = %posted.entry.id,
            entry_number = posted.entry.entry_number,
            lines = posted.entry.lines.len(),
            "Journal entry created"
        );
        Ok(posted.entry)
    }

    /// Replaces a posted entry's content and re-posts it at the current rate.
    ///
    /// # Errors
    ///
    /// - validation errors, before any transaction is opened
    /// - `LedgerError::JournalEntryNotFound` / `LedgerError::AlreadyVoided`
    /// - posting errors and `LedgerError::ConcurrencyConflict`
    #[tracing::instrument(skip(self, input))]
    pub async fn edit(
        &self,
        id: JournalEntryId,
        input: &JournalEntryInput,
    ) -> Result<JournalEntry, LedgerError> {
        let rate = self.rates.current().await?.rate;
        let prepared = JournalService::prepare(input, rate)?;

        let txn = begin(&self.db).await?;
        let mut book = load_book(&txn).await?;
        let existing = load_entry(&txn, id).await?;
        let old = load_transactions(&txn, id).await?;

        let posted = JournalService::edit(&mut book, &existing, &old, &prepared, Utc::now())?;

        delete_children(&txn, id).await?;
        journal_entries::ActiveModel::from(&posted.entry)
            .update(&txn)
            .await
            .map_err(db_err)?;
        insert_lines(&txn, &posted.entry).await?;
        insert_transactions(&txn, &posted.transactions).await?;
        persist_book(&txn, &mut book).await?;
        commit(txn).await?;
        self.cache.invalidate_all();

        info!(
            entry_id = %posted.entry.id,
            entry_number = posted.entry.entry_number,
            lines = posted.entry.lines.len(),
            "Journal entry edited"
        );
        Ok(posted.entry)
    }

    /// Voids a posted entry; its transaction rows are deleted while the
    /// entry and its lines remain.
    ///
    /// # Errors
    ///
    /// `LedgerError::JournalEntryNotFound`, `LedgerError::AlreadyVoided`,
    /// or `LedgerError::ConcurrencyConflict`.
    #[tracing::instrument(skip(self))]
    pub async fn void(&self, id: JournalEntryId) -> Result<VoidOutcome, LedgerError> {
        let txn = begin(&self.db).await?;
        let mut book = load_book(&txn).await?;
        let existing = load_entry(&txn, id).await?;
        let old = load_transactions(&txn, id).await?;

        let voided = JournalService::void(&mut book, &existing, &old, Utc::now())?;

        ledger_transactions::Entity::delete_many()
            .filter(ledger_transactions::Column::JournalEntryId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        journal_entries::ActiveModel::from(&voided)
            .update(&txn)
            .await
            .map_err(db_err)?;
        persist_book(&txn, &mut book).await?;
        commit(txn).await?;
        self.cache.invalidate_all();

        info!(entry_id = %voided.id, entry_number = voided.entry_number, "Journal entry voided");
        Ok(VoidOutcome { success: true })
    }

    /// Returns an entry with its lines and live transaction rows.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::JournalEntryNotFound` if the entry does not exist.
    pub async fn get(&self, id: JournalEntryId) -> Result<PostedEntry, LedgerError> {
        let entry = load_entry(&self.db, id).await?;
        let transactions = load_transactions(&self.db, id).await?;
        Ok(PostedEntry {
            entry,
            transactions,
        })
    }

    /// Lists entries newest first (date, then number), one page at a time.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list(
        &self,
        filter: &JournalFilter,
    ) -> Result<PageResponse<JournalEntry>, LedgerError> {
        let query = filtered(filter);
        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let headers = query
            .order_by_desc(journal_entries::Column::Date)
            .order_by_desc(journal_entries::Column::EntryNumber)
            .offset(filter.page.offset())
            .limit(filter.page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut lines_by_entry: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
        if !ids.is_empty() {
            let lines = journal_lines::Entity::find()
                .filter(journal_lines::Column::JournalEntryId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(db_err)?;
            for line in lines {
                lines_by_entry
                    .entry(line.journal_entry_id)
                    .or_default()
                    .push(line);
            }
        }

        let data = headers
            .into_iter()
            .map(|h| {
                let lines = lines_by_entry.remove(&h.id).unwrap_or_default();
                entry_from_rows(h, lines)
            })
            .collect();

        Ok(PageResponse::new(data, filter.page, total))
    }
}

fn filtered(filter: &JournalFilter) -> Select<journal_entries::Entity> {
    let mut query = journal_entries::Entity::find();

    if let Some(from) = filter.date_from {
        query = query.filter(journal_entries::Column::Date.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(journal_entries::Column::Date.lte(to));
    }
    if let Some(status) = filter.status {
        query = query.filter(journal_entries::Column::Status.eq(JournalStatus::from(status)));
    }
    if let Some(account_id) = filter.account_id {
        query = query.filter(
            journal_entries::Column::Id.in_subquery(
                Query::select()
                    .column(journal_lines::Column::JournalEntryId)
                    .from(journal_lines::Entity)
                    .and_where(journal_lines::Column::AccountId.eq(account_id.into_inner()))
                    .to_owned(),
            ),
        );
    }

    query
}

async fn next_entry_number<C: ConnectionTrait>(db: &C) -> Result<i64, LedgerError> {
    let max: Option<Option<i64>> = journal_entries::Entity::find()
        .select_only()
        .column_as(journal_entries::Column::EntryNumber.max(), "max_number")
        .into_tuple()
        .one(db)
        .await
        .map_err(db_err)?;

    Ok(max.flatten().unwrap_or(0) + 1)
}

async fn load_entry<C: ConnectionTrait>(
    db: &C,
    id: JournalEntryId,
) -> Result<JournalEntry, LedgerError> {
    let header = journal_entries::Entity::find_by_id(id.into_inner())
        .one(db)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::JournalEntryNotFound(id))?;

    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalEntryId.eq(id.into_inner()))
        .order_by_asc(journal_lines::Column::Position)
        .all(db)
        .await
        .map_err(db_err)?;

    Ok(entry_from_rows(header, lines))
}

async fn load_transactions<C: ConnectionTrait>(
    db: &C,
    id: JournalEntryId,
) -> Result<Vec<LedgerTransaction>, LedgerError> {
    let rows = ledger_transactions::Entity::find()
        .filter(ledger_transactions::Column::JournalEntryId.eq(id.into_inner()))
        .order_by_asc(ledger_transactions::Column::CreatedAt)
        .order_by_asc(ledger_transactions::Column::Sequence)
        .all(db)
        .await
        .map_err(db_err)?;

    Ok(rows.into_iter().map(Into::into).collect())
}

async fn insert_lines<C: ConnectionTrait>(db: &C, entry: &JournalEntry) -> Result<(), LedgerError> {
    // insert_many rejects an empty batch
    if entry.lines.is_empty() {
        return Ok(());
    }
    journal_lines::Entity::insert_many(entry.lines.iter().map(journal_lines::ActiveModel::from))
        .exec(db)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn insert_transactions<C: ConnectionTrait>(
    db: &C,
    transactions: &[LedgerTransaction],
) -> Result<(), LedgerError> {
    if transactions.is_empty() {
        return Ok(());
    }
    ledger_transactions::Entity::insert_many(
        transactions.iter().map(ledger_transactions::ActiveModel::from),
    )
    .exec(db)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Deletes an entry's lines and transaction rows ahead of re-posting.
async fn delete_children<C: ConnectionTrait>(
    db: &C,
    id: JournalEntryId,
) -> Result<(), LedgerError> {
    ledger_transactions::Entity::delete_many()
        .filter(ledger_transactions::Column::JournalEntryId.eq(id.into_inner()))
        .exec(db)
        .await
        .map_err(db_err)?;
    journal_lines::Entity::delete_many()
        .filter(journal_lines::Column::JournalEntryId.eq(id.into_inner()))
        .exec(db)
        .await
        .map_err(db_err)?;
    Ok(())
}
