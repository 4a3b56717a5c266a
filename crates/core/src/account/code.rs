//! Account code allocation.
//!
//! Codes are numeric strings inside a per-type range. Parent accounts take
//! round hundreds; leaf accounts take the next free integer above their
//! parent (or the type minimum when they have no parent), staying below the
//! next hundred. Codes freed by deleted accounts are handed out again.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use super::types::AccountType;
use crate::ledger::LedgerError;

/// Width of the block reserved under each parent code.
pub const CODE_BLOCK: u32 = 100;

/// Number of parent slots per account type.
pub const PARENT_SLOTS: u32 = 10;

impl AccountType {
    /// Returns the inclusive numeric code range for this type.
    #[must_use]
    pub const fn code_range(self) -> RangeInclusive<u32> {
        match self {
            Self::Asset => 1000..=1999,
            Self::Liability => 2000..=2999,
            Self::Equity => 3000..=3999,
            Self::Revenue => 4000..=4999,
            Self::Expense => 5000..=5999,
        }
    }

    /// Returns true if `code` falls inside this type's range.
    #[must_use]
    pub fn owns_code(self, code: u32) -> bool {
        self.code_range().contains(&code)
    }
}

/// Picks the next free code for a new account.
///
/// `parent_code` is the code of the new account's parent, if any; `taken`
/// holds every code currently in use.
///
/// # Errors
///
/// Returns `LedgerError::CodeSpaceExhausted` when no slot is left.
pub fn allocate_code(
    account_type: AccountType,
    is_parent: bool,
    parent_code: Option<u32>,
    taken: &HashSet<u32>,
) -> Result<u32, LedgerError> {
    let range = account_type.code_range();
    let (min, max) = (*range.start(), *range.end());

    let candidate = if is_parent {
        (0..PARENT_SLOTS)
            .map(|n| min + n * CODE_BLOCK)
            .filter(|code| *code <= max)
            .find(|code| !taken.contains(code))
    } else {
        let base = parent_code.unwrap_or(min);
        let upper = (base + CODE_BLOCK - 1).min(max);
        (base + 1..=upper).find(|code| !taken.contains(code))
    };

    candidate.ok_or(LedgerError::CodeSpaceExhausted { account_type })
}
