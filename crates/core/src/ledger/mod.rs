//! Double-entry journal engine.
//!
//! This module implements the core ledger functionality:
//! - Line validation and the per-currency balance rule
//! - Posting lines to leaf accounts and reversing them
//! - Parent balance propagation
//! - The journal entry lifecycle (create, edit, void)
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod posting;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::BalancePropagator;
pub use error::{ErrorKind, LedgerError, LineProblem};
pub use posting::TransactionPoster;
pub use service::JournalService;
pub use types::{
    EntryTotals, JournalEntry, JournalEntryInput, JournalEntryLine, JournalFilter,
    JournalLineInput, JournalStatus, LedgerTransaction, PostedEntry, PreparedEntry, PreparedLine,
    VoidOutcome,
};
pub use validation::{CheckedLine, check_line, check_lines, compute_totals, validate_balance};
