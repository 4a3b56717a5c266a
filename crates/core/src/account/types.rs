//! Chart of accounts domain types.

use chrono::{DateTime, Utc};
use daftar_shared::types::{AccountId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account classification, which also fixes the normal balance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Resources owned (1000-1999).
    Asset,
    /// Obligations owed (2000-2999).
    Liability,
    /// Owner's interest (3000-3999).
    Equity,
    /// Income earned (4000-4999).
    Revenue,
    /// Costs incurred (5000-5999).
    Expense,
}

impl AccountType {
    /// All account types in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the side on which this account type naturally increases.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Revenue: credit-normal
    #[must_use]
    pub const fn normal_balance(self) -> BalanceSide {
        match self {
            Self::Asset | Self::Expense => BalanceSide::Debit,
            Self::Liability | Self::Equity | Self::Revenue => BalanceSide::Credit,
        }
    }

    /// Returns the uppercase name used in storage and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "EQUITY" => Ok(Self::Equity),
            "REVENUE" => Ok(Self::Revenue),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Debit or credit side.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BalanceSide {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

impl BalanceSide {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Signed effect of an amount applied on `side` to an account whose
    /// normal balance is `self`: positive when the sides match.
    #[must_use]
    pub fn effect(self, side: Self, amount: Decimal) -> Decimal {
        if self == side { amount } else { -amount }
    }

    /// Returns the uppercase name used in storage and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

impl std::fmt::Display for BalanceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart of accounts entry with its running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Numeric code, unique within the directory.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
    /// Parent accounts aggregate children and never receive postings.
    pub is_parent: bool,
    /// Currency the account is kept in.
    pub currency: Currency,
    /// Side on which the balance grows; fixed at creation.
    pub normal_balance: BalanceSide,
    /// Opening balance magnitude (leaf accounts only).
    pub opening_balance: Decimal,
    /// Side of the opening balance (leaf accounts only).
    pub opening_balance_type: Option<BalanceSide>,
    /// Running balance, signed per `normal_balance`.
    pub current_balance: Decimal,
    /// Set once the first transaction posts; freezes the opening balance.
    pub has_transactions: bool,
    /// Who created the account.
    pub created_by: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns the numeric value of the code.
    #[must_use]
    pub fn code_number(&self) -> Option<u32> {
        self.code.parse().ok()
    }

    /// Opening balance signed against the normal balance.
    #[must_use]
    pub fn signed_opening_balance(&self) -> Decimal {
        let side = self.opening_balance_type.unwrap_or(self.normal_balance);
        self.normal_balance.effect(side, self.opening_balance)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInput {
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Parent account, if any.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// Whether this is an aggregating parent account.
    #[serde(default)]
    pub is_parent: bool,
    /// Currency the account is kept in.
    pub currency: Currency,
    /// Opening balance (ignored for parent accounts).
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
    /// Side of the opening balance; defaults to the normal balance.
    #[serde(default)]
    pub opening_balance_type: Option<BalanceSide>,
    /// Who is creating the account.
    pub created_by: String,
}

/// Input for updating an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountInput {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New currency.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// New opening balance; rejected once the account has transactions.
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
    /// New opening balance side.
    #[serde(default)]
    pub opening_balance_type: Option<BalanceSide>,
}

/// Filter for account listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    /// Only accounts of this type.
    #[serde(default)]
    pub account_type: Option<AccountType>,
    /// Only parent accounts.
    #[serde(default)]
    pub parent_only: bool,
}

impl AccountFilter {
    /// Returns true if the account passes the filter.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        self.account_type.is_none_or(|t| t == account.account_type)
            && (!self.parent_only || account.is_parent)
    }
}

/// An account together with its parent and direct children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    /// The account itself.
    pub account: Account,
    /// Its parent, if any.
    pub parent: Option<Account>,
    /// Direct children ordered by code.
    pub children: Vec<Account>,
}
