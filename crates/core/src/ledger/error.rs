//! Ledger error types for validation and state errors.
//!
//! Every error carries a machine-distinguishable [`ErrorKind`] and a stable
//! error code so callers can map it to their own transport.

use daftar_shared::AppError;
use daftar_shared::types::{AccountId, Currency, JournalEntryId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountType;

/// Coarse classification of ledger errors for boundary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input or business rule rejected before anything was persisted.
    Validation,
    /// A referenced account or journal entry does not exist.
    NotFound,
    /// The atomic unit of work lost a race; retrying is safe.
    Conflict,
    /// Storage or internal failure.
    Unexpected,
}

/// Why a single journal line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineProblem {
    /// No target account was given.
    MissingAccount,
    /// No currency was given.
    MissingCurrency,
    /// Both debit and credit are zero.
    NoAmount,
    /// Both debit and credit are positive.
    BothSides,
    /// Debit or credit is negative.
    NegativeAmount,
    /// Amount carries more than two decimal places.
    ExcessPrecision,
    /// Amount is above the largest storable line amount.
    AmountTooLarge,
}

impl std::fmt::Display for LineProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::MissingAccount => "account is required",
            Self::MissingCurrency => "currency is required",
            Self::NoAmount => "either debit or credit must be positive",
            Self::BothSides => "debit and credit cannot both be positive",
            Self::NegativeAmount => "amounts cannot be negative",
            Self::ExcessPrecision => "amounts cannot have more than two decimal places",
            Self::AmountTooLarge => "amount exceeds the maximum of 999999999999999.99",
        };
        f.write_str(message)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Debits and credits differ for one currency.
    #[error("{currency} imbalance: debits {debits} != credits {credits}")]
    ImbalancedEntry {
        /// The currency that does not balance.
        currency: Currency,
        /// Rounded debit total in that currency.
        debits: Decimal,
        /// Rounded credit total in that currency.
        credits: Decimal,
    },

    /// A line failed structural checks.
    #[error("Invalid journal line {line}: {problem}")]
    InvalidLineInput {
        /// Zero-based line position.
        line: usize,
        /// What is wrong with the line.
        problem: LineProblem,
    },

    /// A journal entry needs at least two lines.
    #[error("Journal entry must have at least 2 lines, got {0}")]
    InsufficientLines(usize),

    /// A structural rule of the chart of accounts was broken.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// No free account code is left for the account type.
    #[error("No account codes left in the {account_type} range")]
    CodeSpaceExhausted {
        /// The account type whose range is full.
        account_type: AccountType,
    },

    /// A balance, total or converted amount would leave the storable range.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Exchange rate must be strictly positive and storable.
    #[error("Exchange rate must be positive and below 10000000000000, got {0}")]
    InvalidExchangeRate(Decimal),

    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    JournalEntryNotFound(JournalEntryId),

    // ========== State Errors ==========
    /// The entry was already voided.
    #[error("Journal entry {0} is already voided")]
    AlreadyVoided(JournalEntryId),

    // ========== Concurrency Errors ==========
    /// The unit of work could not commit because of contention.
    #[error("Concurrent modification detected, please retry")]
    ConcurrencyConflict,

    // ========== Storage Errors ==========
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ImbalancedEntry { .. }
            | Self::InvalidLineInput { .. }
            | Self::InsufficientLines(_)
            | Self::ConstraintViolation(_)
            | Self::CodeSpaceExhausted { .. }
            | Self::AmountOutOfRange(_)
            | Self::InvalidExchangeRate(_)
            | Self::AlreadyVoided(_) => ErrorKind::Validation,
            Self::AccountNotFound(_) | Self::JournalEntryNotFound(_) => ErrorKind::NotFound,
            Self::ConcurrencyConflict => ErrorKind::Conflict,
            Self::Storage(_) | Self::Internal(_) => ErrorKind::Unexpected,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ImbalancedEntry { .. } => "IMBALANCED_ENTRY",
            Self::InvalidLineInput { .. } => "INVALID_LINE_INPUT",
            Self::InsufficientLines(_) => "INSUFFICIENT_LINES",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::CodeSpaceExhausted { .. } => "CODE_SPACE_EXHAUSTED",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::InvalidExchangeRate(_) => "INVALID_EXCHANGE_RATE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::JournalEntryNotFound(_) => "JOURNAL_ENTRY_NOT_FOUND",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the conventional HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unexpected => 500,
        }
    }

    /// Returns true if retrying the whole operation is safe.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }

    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation(message.into())
    }

    pub(crate) fn out_of_range(message: impl Into<String>) -> Self {
        Self::AmountOutOfRange(message.into())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => match err {
                LedgerError::ConstraintViolation(_)
                | LedgerError::CodeSpaceExhausted { .. }
                | LedgerError::AmountOutOfRange(_)
                | LedgerError::AlreadyVoided(_) => Self::BusinessRule(message),
                _ => Self::Validation(message),
            },
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Unexpected => match err {
                LedgerError::Storage(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::ImbalancedEntry {
                currency: Currency::Jod,
                debits: dec!(100),
                credits: dec!(90),
            }
            .error_code(),
            "IMBALANCED_ENTRY"
        );
        assert_eq!(LedgerError::InsufficientLines(1).error_code(), "INSUFFICIENT_LINES");
        assert_eq!(LedgerError::ConcurrencyConflict.error_code(), "CONCURRENCY_CONFLICT");
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::InsufficientLines(0).http_status_code(), 400);
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::JournalEntryNotFound(JournalEntryId::new()).http_status_code(),
            404
        );
        assert_eq!(LedgerError::out_of_range("balance").http_status_code(), 400);
        assert_eq!(LedgerError::ConcurrencyConflict.http_status_code(), 409);
        assert_eq!(LedgerError::Storage("down".into()).http_status_code(), 500);
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(LedgerError::ConcurrencyConflict.is_retryable());
        assert!(!LedgerError::AlreadyVoided(JournalEntryId::new()).is_retryable());
        assert!(!LedgerError::Storage("io".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::ImbalancedEntry {
            currency: Currency::Jod,
            debits: dec!(100.00),
            credits: dec!(90.00),
        };
        assert_eq!(err.to_string(), "JOD imbalance: debits 100.00 != credits 90.00");

        let err = LedgerError::InvalidLineInput {
            line: 2,
            problem: LineProblem::BothSides,
        };
        assert_eq!(
            err.to_string(),
            "Invalid journal line 2: debit and credit cannot both be positive"
        );

        let err = LedgerError::CodeSpaceExhausted {
            account_type: AccountType::Asset,
        };
        assert_eq!(err.to_string(), "No account codes left in the ASSET range");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::AccountNotFound(AccountId::new()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = LedgerError::constraint("has children").into();
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");

        let app: AppError = LedgerError::ConcurrencyConflict.into();
        assert_eq!(app.status_code(), 409);
    }
}
