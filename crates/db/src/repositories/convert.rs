//! Conversions between table rows and engine types.

use chrono::Utc;
use daftar_core::account::Account;
use daftar_core::currency::ExchangeRate;
use daftar_core::ledger::{EntryTotals, JournalEntry, JournalEntryLine, LedgerTransaction};
use daftar_shared::types::{
    AccountId, ExchangeRateId, JournalEntryId, JournalLineId, LedgerTransactionId,
};
use sea_orm::Set;

use crate::entities::{
    accounts, exchange_rates, journal_entries, journal_lines, ledger_transactions,
};

impl From<accounts::Model> for Account {
    fn from(m: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(m.id),
            code: m.code,
            name: m.name,
            account_type: m.account_type.into(),
            parent_id: m.parent_id.map(AccountId::from_uuid),
            is_parent: m.is_parent,
            currency: m.currency.into(),
            normal_balance: m.normal_balance.into(),
            opening_balance: m.opening_balance,
            opening_balance_type: m.opening_balance_type.map(Into::into),
            current_balance: m.current_balance,
            has_transactions: m.has_transactions,
            created_by: m.created_by,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<&Account> for accounts::ActiveModel {
    fn from(a: &Account) -> Self {
        Self {
            id: Set(a.id.into_inner()),
            code: Set(a.code.clone()),
            name: Set(a.name.clone()),
            account_type: Set(a.account_type.into()),
            parent_id: Set(a.parent_id.map(AccountId::into_inner)),
            is_parent: Set(a.is_parent),
            currency: Set(a.currency.into()),
            normal_balance: Set(a.normal_balance.into()),
            opening_balance: Set(a.opening_balance),
            opening_balance_type: Set(a.opening_balance_type.map(Into::into)),
            current_balance: Set(a.current_balance),
            has_transactions: Set(a.has_transactions),
            created_by: Set(a.created_by.clone()),
            created_at: Set(a.created_at.into()),
            updated_at: Set(a.updated_at.into()),
        }
    }
}

/// Assembles an entry from its header row and its line rows.
pub(crate) fn entry_from_rows(
    header: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> JournalEntry {
    let mut lines: Vec<JournalEntryLine> = lines.into_iter().map(Into::into).collect();
    lines.sort_by_key(|l| l.position);

    JournalEntry {
        id: JournalEntryId::from_uuid(header.id),
        entry_number: header.entry_number,
        date: header.date,
        description: header.description,
        reference: header.reference,
        status: header.status.into(),
        totals: EntryTotals {
            total_debits_jod: header.total_debits_jod,
            total_credits_jod: header.total_credits_jod,
            total_debits_usdt: header.total_debits_usdt,
            total_credits_usdt: header.total_credits_usdt,
        },
        created_by: header.created_by,
        created_at: header.created_at.with_timezone(&Utc),
        updated_at: header.updated_at.with_timezone(&Utc),
        lines,
    }
}

impl From<&JournalEntry> for journal_entries::ActiveModel {
    fn from(e: &JournalEntry) -> Self {
        Self {
            id: Set(e.id.into_inner()),
            entry_number: Set(e.entry_number),
            date: Set(e.date),
            description: Set(e.description.clone()),
            reference: Set(e.reference.clone()),
            status: Set(e.status.into()),
            total_debits_jod: Set(e.totals.total_debits_jod),
            total_credits_jod: Set(e.totals.total_credits_jod),
            total_debits_usdt: Set(e.totals.total_debits_usdt),
            total_credits_usdt: Set(e.totals.total_credits_usdt),
            created_by: Set(e.created_by.clone()),
            created_at: Set(e.created_at.into()),
            updated_at: Set(e.updated_at.into()),
        }
    }
}

impl From<journal_lines::Model> for JournalEntryLine {
    fn from(m: journal_lines::Model) -> Self {
        Self {
            id: JournalLineId::from_uuid(m.id),
            journal_entry_id: JournalEntryId::from_uuid(m.journal_entry_id),
            position: m.position,
            account_id: AccountId::from_uuid(m.account_id),
            debit_amount: m.debit_amount,
            credit_amount: m.credit_amount,
            currency: m.currency.into(),
            exchange_rate: m.exchange_rate,
            converted_amount_jod: m.converted_amount_jod,
            description: m.description,
        }
    }
}

impl From<&JournalEntryLine> for journal_lines::ActiveModel {
    fn from(l: &JournalEntryLine) -> Self {
        Self {
            id: Set(l.id.into_inner()),
            journal_entry_id: Set(l.journal_entry_id.into_inner()),
            position: Set(l.position),
            account_id: Set(l.account_id.into_inner()),
            debit_amount: Set(l.debit_amount),
            credit_amount: Set(l.credit_amount),
            currency: Set(l.currency.into()),
            exchange_rate: Set(l.exchange_rate),
            converted_amount_jod: Set(l.converted_amount_jod),
            description: Set(l.description.clone()),
        }
    }
}

impl From<ledger_transactions::Model> for LedgerTransaction {
    fn from(m: ledger_transactions::Model) -> Self {
        Self {
            id: LedgerTransactionId::from_uuid(m.id),
            journal_entry_id: JournalEntryId::from_uuid(m.journal_entry_id),
            account_id: AccountId::from_uuid(m.account_id),
            amount: m.amount,
            transaction_type: m.transaction_type.into(),
            currency: m.currency.into(),
            exchange_rate: m.exchange_rate,
            balance_before: m.balance_before,
            balance_after: m.balance_after,
            date: m.date,
            description: m.description,
            sequence: m.sequence,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&LedgerTransaction> for ledger_transactions::ActiveModel {
    fn from(t: &LedgerTransaction) -> Self {
        Self {
            id: Set(t.id.into_inner()),
            journal_entry_id: Set(t.journal_entry_id.into_inner()),
            account_id: Set(t.account_id.into_inner()),
            amount: Set(t.amount),
            transaction_type: Set(t.transaction_type.into()),
            currency: Set(t.currency.into()),
            exchange_rate: Set(t.exchange_rate),
            balance_before: Set(t.balance_before),
            balance_after: Set(t.balance_after),
            date: Set(t.date),
            description: Set(t.description.clone()),
            sequence: Set(t.sequence),
            created_at: Set(t.created_at.into()),
        }
    }
}

impl From<exchange_rates::Model> for ExchangeRate {
    fn from(m: exchange_rates::Model) -> Self {
        Self {
            id: ExchangeRateId::from_uuid(m.id),
            rate: m.rate,
            updated_by: m.updated_by,
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<&ExchangeRate> for exchange_rates::ActiveModel {
    fn from(r: &ExchangeRate) -> Self {
        Self {
            id: Set(r.id.into_inner()),
            rate: Set(r.rate),
            updated_by: Set(r.updated_by.clone()),
            updated_at: Set(r.updated_at.into()),
        }
    }
}
