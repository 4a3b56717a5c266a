//! Ledger schema: accounts, journal entries and lines, posted transactions,
//! and the exchange rate record.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;
        db.execute_unprepared(LEDGER_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: EXCHANGE RATE
        // ============================================================
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(4) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(16) NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    is_parent BOOLEAN NOT NULL DEFAULT false,
    currency VARCHAR(8) NOT NULL,
    normal_balance VARCHAR(8) NOT NULL,
    opening_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    opening_balance_type VARCHAR(8),
    current_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    has_transactions BOOLEAN NOT NULL DEFAULT false,
    created_by VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_type CHECK (
        account_type IN ('ASSET', 'LIABILITY', 'EQUITY', 'REVENUE', 'EXPENSE')
    ),
    CONSTRAINT chk_account_currency CHECK (currency IN ('JOD', 'USDT')),
    CONSTRAINT chk_normal_balance CHECK (normal_balance IN ('DEBIT', 'CREDIT')),
    CONSTRAINT chk_opening_balance_type CHECK (
        opening_balance_type IS NULL OR opening_balance_type IN ('DEBIT', 'CREDIT')
    ),
    CONSTRAINT chk_opening_balance_non_negative CHECK (opening_balance >= 0),
    CONSTRAINT chk_parent_has_no_opening_balance CHECK (
        NOT is_parent OR (opening_balance = 0 AND opening_balance_type IS NULL)
    )
);

CREATE INDEX idx_accounts_type_code ON accounts(account_type, code);
CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    entry_number BIGINT NOT NULL,
    date DATE NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(100),
    status VARCHAR(8) NOT NULL DEFAULT 'POSTED',
    total_debits_jod NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total_credits_jod NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total_debits_usdt NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total_credits_usdt NUMERIC(19, 2) NOT NULL DEFAULT 0,
    created_by VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_journal_status CHECK (status IN ('POSTED', 'VOIDED')),
    CONSTRAINT chk_entry_balanced CHECK (
        total_debits_jod = total_credits_jod AND total_debits_usdt = total_credits_usdt
    )
);

CREATE UNIQUE INDEX idx_journal_entries_number ON journal_entries(entry_number);
CREATE INDEX idx_journal_entries_date ON journal_entries(date DESC, entry_number DESC);
CREATE INDEX idx_journal_entries_status ON journal_entries(status);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    credit_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    currency VARCHAR(8) NOT NULL,
    exchange_rate NUMERIC(19, 6) NOT NULL,
    converted_amount_jod NUMERIC(19, 2) NOT NULL,
    description TEXT,
    CONSTRAINT chk_line_currency CHECK (currency IN ('JOD', 'USDT')),
    CONSTRAINT chk_line_one_side CHECK (
        (debit_amount > 0 AND credit_amount = 0) OR (debit_amount = 0 AND credit_amount > 0)
    ),
    CONSTRAINT chk_line_rate_positive CHECK (exchange_rate > 0),
    UNIQUE (journal_entry_id, position)
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const LEDGER_TRANSACTIONS_SQL: &str = r"
CREATE TABLE ledger_transactions (
    id UUID PRIMARY KEY,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    amount NUMERIC(19, 2) NOT NULL,
    transaction_type VARCHAR(8) NOT NULL,
    currency VARCHAR(8) NOT NULL,
    exchange_rate NUMERIC(19, 6) NOT NULL,
    balance_before NUMERIC(19, 2) NOT NULL,
    balance_after NUMERIC(19, 2) NOT NULL,
    date DATE NOT NULL,
    description TEXT,
    sequence INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_type CHECK (transaction_type IN ('DEBIT', 'CREDIT')),
    CONSTRAINT chk_transaction_currency CHECK (currency IN ('JOD', 'USDT')),
    CONSTRAINT chk_transaction_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_ledger_transactions_entry ON ledger_transactions(journal_entry_id);
CREATE INDEX idx_ledger_transactions_account ON ledger_transactions(account_id, created_at);
";

const EXCHANGE_RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY,
    rate NUMERIC(19, 6) NOT NULL,
    updated_by VARCHAR(255) NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rate_positive CHECK (rate > 0)
);

-- At most one rate record
CREATE UNIQUE INDEX idx_exchange_rates_single ON exchange_rates ((true));
";

const DROP_ALL_SQL: &str = r"
-- Order matters due to foreign key constraints
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS ledger_transactions CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
";
