//! Core ledger engine for Daftar.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Stores load the state an operation needs, hand it to the engine, and
//! persist whatever the engine changed.
//!
//! # Modules
//!
//! - `account` - Chart of accounts, code allocation and the account tree
//! - `currency` - JOD/USDT conversion and the exchange rate record
//! - `ledger` - Double-entry validation, posting and the journal lifecycle
//! - `store` - In-process store that runs each operation as one unit of work

pub mod account;
pub mod currency;
pub mod ledger;
pub mod store;

pub use ledger::{ErrorKind, LedgerError};
