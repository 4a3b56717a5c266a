//! Column enums stored as constrained `VARCHAR`s, with conversions to the
//! engine's types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use daftar_core::account::{AccountType as CoreAccountType, BalanceSide as CoreBalanceSide};
use daftar_core::ledger::JournalStatus as CoreJournalStatus;
use daftar_shared::types::Currency as CoreCurrency;

/// `accounts.account_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountType {
    /// Asset
    #[sea_orm(string_value = "ASSET")]
    Asset,
    /// Liability
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    /// Equity
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    /// Revenue
    #[sea_orm(string_value = "REVENUE")]
    Revenue,
    /// Expense
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// Debit or credit; used for normal balances, opening balance sides and
/// transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum BalanceSide {
    /// Debit
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    /// Credit
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

/// Settlement currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum Currency {
    /// Jordanian dinar
    #[sea_orm(string_value = "JOD")]
    Jod,
    /// Tether
    #[sea_orm(string_value = "USDT")]
    Usdt,
}

/// `journal_entries.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum JournalStatus {
    /// Posted
    #[sea_orm(string_value = "POSTED")]
    Posted,
    /// Voided
    #[sea_orm(string_value = "VOIDED")]
    Voided,
}

macro_rules! mirror_enum {
    ($db:ident <=> $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType <=> CoreAccountType { Asset, Liability, Equity, Revenue, Expense });
mirror_enum!(BalanceSide <=> CoreBalanceSide { Debit, Credit });
mirror_enum!(Currency <=> CoreCurrency { Jod, Usdt });
mirror_enum!(JournalStatus <=> CoreJournalStatus { Posted, Voided });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_round_trips_through_core() {
        for account_type in CoreAccountType::ALL {
            let stored = AccountType::from(account_type);
            assert_eq!(CoreAccountType::from(stored), account_type);
            assert_eq!(stored.to_value(), account_type.as_str());
        }
    }

    #[test]
    fn test_string_values_match_core_wire_names() {
        assert_eq!(BalanceSide::from(CoreBalanceSide::Credit).to_value(), "CREDIT");
        assert_eq!(Currency::from(CoreCurrency::Usdt).to_value(), "USDT");
        assert_eq!(JournalStatus::from(CoreJournalStatus::Voided).to_value(), "VOIDED");
    }
}
