//! Mapping of database failures onto the ledger error taxonomy.

use daftar_core::LedgerError;
use sea_orm::{DbErr, RuntimeErr};

/// SQLSTATE raised when a serializable transaction cannot be committed.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE raised when Postgres breaks a lock cycle.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE raised by a unique index, e.g. two creators taking the same
/// entry number.
const UNIQUE_VIOLATION: &str = "23505";

/// Converts a `SeaORM` error into a [`LedgerError`].
///
/// Lost races surface as `ConcurrencyConflict` so callers can retry;
/// everything else is a storage failure.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    match sqlstate(&err).as_deref() {
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION) => {
            LedgerError::ConcurrencyConflict
        }
        _ => LedgerError::Storage(err.to_string()),
    }
}

/// Returns true if `err` is a unique-index violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}
