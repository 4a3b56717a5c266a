//! `SeaORM` entity definitions for the ledger tables.

pub mod accounts;
pub mod exchange_rates;
pub mod journal_entries;
pub mod journal_lines;
pub mod ledger_transactions;
pub mod sea_orm_active_enums;
