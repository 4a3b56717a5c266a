//! Property-based tests for the journal lifecycle.
//!
//! - Parent balances always equal the sum of their children
//! - Voiding restores the balances from before the entry
//! - Editing an entry to identical content changes nothing
//! - Propagation is idempotent

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use daftar_shared::types::{AccountId, Currency};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::BalancePropagator;
use super::service::JournalService;
use super::types::{JournalEntryInput, JournalLineInput, PostedEntry};
use crate::account::{AccountBook, AccountDirectory, AccountType, CreateAccountInput};

struct Chart {
    book: AccountBook,
    parents: Vec<AccountId>,
    leaves: Vec<AccountId>,
}

fn chart() -> Chart {
    let mut book = AccountBook::new();
    let now = Utc::now();
    let mut create = |name: &str, account_type, is_parent, parent_id| {
        AccountDirectory::create(
            &mut book,
            &CreateAccountInput {
                name: name.into(),
                account_type,
                parent_id,
                is_parent,
                currency: Currency::Jod,
                opening_balance: None,
                opening_balance_type: None,
                created_by: "props".into(),
            },
            now,
        )
        .unwrap()
        .id
    };

    let assets = create("Assets", AccountType::Asset, true, None);
    let current = create("Current", AccountType::Asset, true, Some(assets));
    let cash = create("Cash", AccountType::Asset, false, Some(current));
    let bank = create("Bank", AccountType::Asset, false, Some(current));
    let revenue = create("Revenue", AccountType::Revenue, true, None);
    let sales = create("Sales", AccountType::Revenue, false, Some(revenue));
    let rent = create("Rent", AccountType::Expense, false, None);

    Chart {
        book,
        parents: vec![assets, current, revenue],
        leaves: vec![cash, bank, sales, rent],
    }
}

/// (debit leaf index, credit leaf index, cents, currency)
type EntryShape = (usize, usize, i64, bool);

fn entry_shape() -> impl Strategy<Value = EntryShape> {
    (0usize..4, 0usize..4, 1i64..10_000_000i64, any::<bool>())
}

fn entry_input(chart: &Chart, shape: EntryShape) -> JournalEntryInput {
    let (debit, credit, cents, usdt) = shape;
    let amount = Decimal::new(cents, 2);
    let currency = if usdt { Currency::Usdt } else { Currency::Jod };
    JournalEntryInput {
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        description: "generated".into(),
        reference: None,
        lines: vec![
            JournalLineInput::debit(chart.leaves[debit], amount, currency),
            JournalLineInput::credit(chart.leaves[credit], amount, currency),
        ],
        created_by: "props".into(),
    }
}

fn post(chart: &mut Chart, shape: EntryShape, number: i64) -> PostedEntry {
    let prepared = JournalService::prepare(&entry_input(chart, shape), Decimal::new(71, 2)).unwrap();
    JournalService::create(&mut chart.book, &prepared, number, Utc::now()).unwrap()
}

fn balances(book: &AccountBook) -> HashMap<AccountId, Decimal> {
    book.accounts().map(|a| (a.id, a.current_balance)).collect()
}

fn parents_consistent(chart: &Chart) -> bool {
    chart.parents.iter().all(|id| {
        let sum: Decimal = chart.book.children_of(*id).map(|c| c.current_balance).sum();
        chart.book.get(*id).is_some_and(|p| p.current_balance == sum)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any sequence of creates and voids, parents equal the sum of
    /// their children.
    #[test]
    fn prop_parents_track_children(
        shapes in prop::collection::vec(entry_shape(), 1..12),
        void_mask in prop::collection::vec(any::<bool>(), 12),
    ) {
        let mut chart = chart();
        let mut posted = Vec::new();
        for (number, shape) in (1_i64..).zip(shapes) {
            posted.push(post(&mut chart, shape, number));
            prop_assert!(parents_consistent(&chart));
        }

        for (entry, void) in posted.iter().zip(void_mask) {
            if void {
                JournalService::void(&mut chart.book, &entry.entry, &entry.transactions, Utc::now())
                    .unwrap();
                prop_assert!(parents_consistent(&chart));
            }
        }
    }

    /// Voiding an entry gives back the balances from just before it was
    /// posted, even with other entries posted before it.
    #[test]
    fn prop_void_round_trip(
        history in prop::collection::vec(entry_shape(), 0..6),
        target in entry_shape(),
    ) {
        let mut chart = chart();
        let mut number = 0;
        for shape in history {
            number += 1;
            post(&mut chart, shape, number);
        }
        let before = balances(&chart.book);

        let entry = post(&mut chart, target, number + 1);
        JournalService::void(&mut chart.book, &entry.entry, &entry.transactions, Utc::now())
            .unwrap();

        prop_assert_eq!(balances(&chart.book), before);
    }

    /// Editing an entry to the same content leaves balances unchanged.
    #[test]
    fn prop_edit_identity(shape in entry_shape(), other in entry_shape()) {
        let mut chart = chart();
        post(&mut chart, other, 1);
        let entry = post(&mut chart, shape, 2);
        let after_post = balances(&chart.book);

        let prepared =
            JournalService::prepare(&entry_input(&chart, shape), Decimal::new(71, 2)).unwrap();
        let edited = JournalService::edit(
            &mut chart.book,
            &entry.entry,
            &entry.transactions,
            &prepared,
            Utc::now(),
        )
        .unwrap();

        prop_assert_eq!(balances(&chart.book), after_post);
        prop_assert_eq!(edited.entry.totals, entry.entry.totals);
        prop_assert_eq!(edited.entry.entry_number, 2);
    }

    /// Propagating twice over an unchanged subtree gives the same balances.
    #[test]
    fn prop_propagation_idempotent(shapes in prop::collection::vec(entry_shape(), 1..6)) {
        let mut chart = chart();
        for (number, shape) in (1_i64..).zip(shapes) {
            post(&mut chart, shape, number);
        }

        let now = Utc::now();
        for id in chart.parents.clone() {
            BalancePropagator::propagate(&mut chart.book, id, now).unwrap();
        }
        let first = balances(&chart.book);
        for id in chart.parents.clone() {
            BalancePropagator::propagate(&mut chart.book, id, now).unwrap();
        }

        prop_assert_eq!(balances(&chart.book), first);
    }
}
