//! Database seeder for Daftar development and testing.
//!
//! Seeds a starter chart of accounts and stores the default exchange rate.
//! Running it against a chart that already has accounts only ensures the
//! rate exists.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daftar_core::account::{AccountFilter, AccountType, CreateAccountInput};
use daftar_db::{AccountRepository, Repositories};
use daftar_shared::AppConfig;
use daftar_shared::types::{AccountId, Currency};

const SEEDED_BY: &str = "seeder";

/// Top-level parent accounts and their leaves.
const STARTER_CHART: &[(&str, AccountType, &[(&str, Currency)])] = &[
    (
        "Assets",
        AccountType::Asset,
        &[
            ("Cash", Currency::Jod),
            ("Bank", Currency::Jod),
            ("USDT Wallet", Currency::Usdt),
        ],
    ),
    (
        "Liabilities",
        AccountType::Liability,
        &[("Accounts Payable", Currency::Jod)],
    ),
    ("Equity", AccountType::Equity, &[("Owner Capital", Currency::Jod)]),
    (
        "Revenue",
        AccountType::Revenue,
        &[("Sales", Currency::Jod), ("Exchange Gains", Currency::Jod)],
    ),
    (
        "Expenses",
        AccountType::Expense,
        &[("Rent", Currency::Jod), ("Salaries", Currency::Jod)],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daftar=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = daftar_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let repos = Repositories::new(&db, &config.ledger);

    let existing = repos.accounts.list(AccountFilter::default()).await?;
    if existing.is_empty() {
        seed_chart(&repos.accounts).await?;
    } else {
        info!(accounts = existing.len(), "Chart of accounts already present, skipping");
    }

    let rate = repos.rates.current().await?;
    info!(rate = %rate.rate, "Exchange rate ready");

    info!("Seeding complete");
    Ok(())
}

async fn seed_chart(accounts: &AccountRepository) -> anyhow::Result<()> {
    for (name, account_type, leaves) in STARTER_CHART {
        let parent = accounts
            .create(&input(name, *account_type, Currency::Jod, true, None))
            .await
            .with_context(|| format!("Failed to create {name}"))?;
        info!(code = %parent.code, name, "Seeded parent account");

        for (leaf, currency) in *leaves {
            let child = accounts
                .create(&input(leaf, *account_type, *currency, false, Some(parent.id)))
                .await
                .with_context(|| format!("Failed to create {leaf}"))?;
            info!(code = %child.code, name = leaf, "Seeded account");
        }
    }
    Ok(())
}

fn input(
    name: &str,
    account_type: AccountType,
    currency: Currency,
    is_parent: bool,
    parent_id: Option<AccountId>,
) -> CreateAccountInput {
    CreateAccountInput {
        name: name.to_string(),
        account_type,
        parent_id,
        is_parent,
        currency,
        opening_balance: None,
        opening_balance_type: None,
        created_by: SEEDED_BY.to_string(),
    }
}
