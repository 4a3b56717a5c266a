//! Journal domain types.
//!
//! Inputs arrive in the shape callers send them; the lifecycle service turns
//! them into [`PreparedEntry`] values that are already validated and
//! converted, and the poster turns lines into [`LedgerTransaction`] rows.

use chrono::{DateTime, NaiveDate, Utc};
use daftar_shared::types::{
    AccountId, Currency, JournalEntryId, JournalLineId, LedgerTransactionId, PageRequest,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::BalanceSide;

/// Journal entry status. There is no draft state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalStatus {
    /// Entry is live and its transactions affect balances.
    Posted,
    /// Entry was reversed; terminal.
    Voided,
}

impl JournalStatus {
    /// Returns true if the entry can still be edited or voided.
    #[must_use]
    pub const fn is_posted(self) -> bool {
        matches!(self, Self::Posted)
    }

    /// Returns the uppercase name used in storage and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posted => "POSTED",
            Self::Voided => "VOIDED",
        }
    }
}

/// One caller-supplied journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineInput {
    /// Target account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Debit amount (zero when the line is a credit).
    #[serde(default)]
    pub debit_amount: Decimal,
    /// Credit amount (zero when the line is a debit).
    #[serde(default)]
    pub credit_amount: Decimal,
    /// Currency of the amounts.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Optional line memo.
    #[serde(default)]
    pub description: Option<String>,
}

impl JournalLineInput {
    /// Debit line shorthand.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self {
            account_id: Some(account_id),
            debit_amount: amount,
            credit_amount: Decimal::ZERO,
            currency: Some(currency),
            description: None,
        }
    }

    /// Credit line shorthand.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self {
            account_id: Some(account_id),
            debit_amount: Decimal::ZERO,
            credit_amount: amount,
            currency: Some(currency),
            description: None,
        }
    }
}

/// Input for creating or editing a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryInput {
    /// Accounting date.
    pub date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// Optional external reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Lines of the entry.
    pub lines: Vec<JournalLineInput>,
    /// Who is recording the entry.
    pub created_by: String,
}

/// Per-currency debit and credit totals, rounded to 2 dp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryTotals {
    /// Total JOD debits.
    #[serde(rename = "totalDebitsJOD")]
    pub total_debits_jod: Decimal,
    /// Total JOD credits.
    #[serde(rename = "totalCreditsJOD")]
    pub total_credits_jod: Decimal,
    /// Total USDT debits.
    #[serde(rename = "totalDebitsUSDT")]
    pub total_debits_usdt: Decimal,
    /// Total USDT credits.
    #[serde(rename = "totalCreditsUSDT")]
    pub total_credits_usdt: Decimal,
}

impl EntryTotals {
    /// Returns (debits, credits) for `currency`.
    #[must_use]
    pub const fn for_currency(&self, currency: Currency) -> (Decimal, Decimal) {
        match currency {
            Currency::Jod => (self.total_debits_jod, self.total_credits_jod),
            Currency::Usdt => (self.total_debits_usdt, self.total_credits_usdt),
        }
    }

    /// Returns true if every currency balances.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debits_jod == self.total_credits_jod
            && self.total_debits_usdt == self.total_credits_usdt
    }
}

/// A line that passed validation and has been converted to JOD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLine {
    /// Target account.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: BalanceSide,
    /// Strictly positive amount with at most 2 dp.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// JOD per USDT in effect for this line.
    pub exchange_rate: Decimal,
    /// `amount` expressed in JOD.
    pub converted_amount_jod: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

/// A validated entry ready to be written inside a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEntry {
    /// Accounting date.
    pub date: NaiveDate,
    /// Trimmed description.
    pub description: String,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Who is recording the entry.
    pub created_by: String,
    /// Lines in input order.
    pub lines: Vec<PreparedLine>,
    /// Per-currency totals.
    pub totals: EntryTotals,
    /// Exchange rate the lines were converted with.
    pub exchange_rate: Decimal,
}

/// A persisted journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryLine {
    /// Line id.
    pub id: JournalLineId,
    /// Owning entry.
    pub journal_entry_id: JournalEntryId,
    /// Zero-based position in the entry.
    pub position: i32,
    /// Target account.
    pub account_id: AccountId,
    /// Debit amount (zero for credit lines).
    pub debit_amount: Decimal,
    /// Credit amount (zero for debit lines).
    pub credit_amount: Decimal,
    /// Currency of the amounts.
    pub currency: Currency,
    /// JOD per USDT at posting time.
    pub exchange_rate: Decimal,
    /// Line amount in JOD at posting time.
    #[serde(rename = "convertedAmountJOD")]
    pub converted_amount_jod: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

impl JournalEntryLine {
    /// Returns the side and the positive amount of the line.
    #[must_use]
    pub fn side_amount(&self) -> (BalanceSide, Decimal) {
        if self.debit_amount > Decimal::ZERO {
            (BalanceSide::Debit, self.debit_amount)
        } else {
            (BalanceSide::Credit, self.credit_amount)
        }
    }
}

/// A journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Entry id.
    pub id: JournalEntryId,
    /// Gapless human-facing number.
    pub entry_number: i64,
    /// Accounting date.
    pub date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: JournalStatus,
    /// Per-currency totals.
    #[serde(flatten)]
    pub totals: EntryTotals,
    /// Who recorded the entry.
    pub created_by: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last changed.
    pub updated_at: DateTime<Utc>,
    /// Lines ordered by position.
    pub lines: Vec<JournalEntryLine>,
}

/// Immutable audit row written for each posted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    /// Row id.
    pub id: LedgerTransactionId,
    /// Entry that produced the row.
    pub journal_entry_id: JournalEntryId,
    /// Account the amount was applied to.
    pub account_id: AccountId,
    /// Posted amount (positive).
    pub amount: Decimal,
    /// Debit or credit.
    #[serde(rename = "type")]
    pub transaction_type: BalanceSide,
    /// Currency of the amount.
    pub currency: Currency,
    /// Exchange rate recorded at posting.
    pub exchange_rate: Decimal,
    /// Account balance before the posting.
    pub balance_before: Decimal,
    /// Account balance after the posting.
    pub balance_after: Decimal,
    /// Accounting date of the entry.
    pub date: NaiveDate,
    /// Line memo, if any.
    pub description: Option<String>,
    /// Order within the posting batch.
    pub sequence: i32,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

/// A journal entry together with its live transaction rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedEntry {
    /// The entry with its lines.
    pub entry: JournalEntry,
    /// Transaction rows in posting order (empty once voided).
    pub transactions: Vec<LedgerTransaction>,
}

/// Result of voiding an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidOutcome {
    /// Always true when returned; failures are errors.
    pub success: bool,
}

/// Filter for listing journal entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalFilter {
    /// Earliest date, inclusive.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Only entries with a line on this account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Only entries in this status.
    #[serde(default)]
    pub status: Option<JournalStatus>,
    /// Page to return.
    #[serde(flatten)]
    pub page: PageRequest,
}

impl JournalFilter {
    /// Returns true if `entry` passes every criterion except paging.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.date_from.is_none_or(|from| entry.date >= from)
            && self.date_to.is_none_or(|to| entry.date <= to)
            && self.status.is_none_or(|status| entry.status == status)
            && self
                .account_id
                .is_none_or(|id| entry.lines.iter().any(|line| line.account_id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_input_defaults_from_json() {
        let line: JournalLineInput = serde_json::from_str(r#"{"debitAmount": "12.50"}"#).unwrap();
        assert_eq!(line.debit_amount, dec!(12.50));
        assert_eq!(line.credit_amount, Decimal::ZERO);
        assert!(line.account_id.is_none());
        assert!(line.currency.is_none());
    }

    #[test]
    fn test_totals_serialize_with_currency_suffix() {
        let totals = EntryTotals {
            total_debits_jod: dec!(1),
            ..EntryTotals::default()
        };
        let json = serde_json::to_value(totals).unwrap();
        assert!(json.get("totalDebitsJOD").is_some());
        assert!(json.get("totalCreditsUSDT").is_some());
    }

    #[test]
    fn test_side_amount() {
        let line = JournalEntryLine {
            id: JournalLineId::new(),
            journal_entry_id: JournalEntryId::new(),
            position: 0,
            account_id: AccountId::new(),
            debit_amount: Decimal::ZERO,
            credit_amount: dec!(30),
            currency: Currency::Jod,
            exchange_rate: dec!(0.71),
            converted_amount_jod: dec!(30),
            description: None,
        };
        assert_eq!(line.side_amount(), (BalanceSide::Credit, dec!(30)));
    }

    #[test]
    fn test_status_names() {
        assert_eq!(serde_json::to_string(&JournalStatus::Voided).unwrap(), "\"VOIDED\"");
        assert!(JournalStatus::Posted.is_posted());
        assert!(!JournalStatus::Voided.is_posted());
    }
}
