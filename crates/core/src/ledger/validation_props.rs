//! Property-based tests for journal line validation and the balance rule.

use daftar_shared::types::{AccountId, Currency, round_money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::{LedgerError, LineProblem};
use super::types::JournalLineInput;
use super::validation::{check_line, check_lines, validate_balance};
use crate::currency::to_jod;

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate an exchange rate (0.000001 to 10.000000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|micros| Decimal::new(micros, 6))
}

fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![Just(Currency::Jod), Just(Currency::Usdt)]
}

/// Balanced lines: every generated amount appears once as a debit and once
/// as a credit in the same currency.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLineInput>> {
    prop::collection::vec((positive_amount(), currency_strategy()), 1..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .flat_map(|(amount, currency)| {
                [
                    JournalLineInput::debit(AccountId::new(), amount, currency),
                    JournalLineInput::credit(AccountId::new(), amount, currency),
                ]
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced input always passes and debit totals equal credit totals.
    #[test]
    fn prop_balanced_lines_pass(lines in balanced_lines()) {
        let checked = check_lines(&lines).unwrap();
        let totals = validate_balance(&checked).unwrap();

        prop_assert!(totals.is_balanced());
        for currency in Currency::ALL {
            let (debits, credits) = totals.for_currency(currency);
            prop_assert_eq!(debits, credits);
            prop_assert_eq!(round_money(debits), debits);
        }
    }

    /// Bumping one credit by a cent always breaks the balance in its currency.
    #[test]
    fn prop_one_cent_off_is_rejected(lines in balanced_lines(), pick in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let credit_positions: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.credit_amount > Decimal::ZERO)
            .map(|(i, _)| i)
            .collect();
        let target = credit_positions[pick.index(credit_positions.len())];
        lines[target].credit_amount += Decimal::new(1, 2);
        let expected_currency = lines[target].currency.unwrap();

        let checked = check_lines(&lines).unwrap();
        match validate_balance(&checked) {
            Err(LedgerError::ImbalancedEntry { currency, debits, credits }) => {
                prop_assert_eq!(currency, expected_currency);
                prop_assert_ne!(debits, credits);
            }
            other => prop_assert!(false, "expected imbalance, got {:?}", other),
        }
    }

    /// A line with both sides positive is rejected regardless of amounts.
    #[test]
    fn prop_both_sides_rejected(debit in positive_amount(), credit in positive_amount()) {
        let line = JournalLineInput {
            account_id: Some(AccountId::new()),
            debit_amount: debit,
            credit_amount: credit,
            currency: Some(Currency::Jod),
            description: None,
        };

        let result = check_line(0, &line);
        let is_both_sides = matches!(
            result,
            Err(LedgerError::InvalidLineInput { problem: LineProblem::BothSides, .. })
        );
        prop_assert!(is_both_sides);
    }

    /// Amounts with a third decimal place are rejected.
    #[test]
    fn prop_sub_cent_amounts_rejected(mills in 1i64..1_000_000i64) {
        prop_assume!(mills % 10 != 0);
        let line = JournalLineInput::debit(AccountId::new(), Decimal::new(mills, 3), Currency::Usdt);

        let result = check_line(0, &line);
        let is_precision = matches!(
            result,
            Err(LedgerError::InvalidLineInput { problem: LineProblem::ExcessPrecision, .. })
        );
        prop_assert!(is_precision);
    }

    /// USDT converts to JOD as amount * rate rounded to cents; JOD is unchanged.
    #[test]
    fn prop_jod_conversion(amount in positive_amount(), rate in positive_rate()) {
        prop_assert_eq!(to_jod(amount, Currency::Usdt, rate).unwrap(), round_money(amount * rate));
        prop_assert_eq!(to_jod(amount, Currency::Jod, rate).unwrap(), amount);
    }
}
