//! Core ledger schema.
//!
//! Creates wallets, ledger entries, advance balances, accounting periods,
//! the audit log and the sequence counters.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;
        db.execute_unprepared(ADVANCE_SQL).await?;
        db.execute_unprepared(PERIODS_SQL).await?;
        db.execute_unprepared(AUDIT_SQL).await?;
        db.execute_unprepared(SEQUENCE_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE wallet_kind AS ENUM ('BANK', 'CASH', 'INVESTMENT');

CREATE TYPE tx_type AS ENUM (
    'FEE_PAYMENT',
    'EXPENSE_PAYMENT',
    'PAYROLL_PAYMENT',
    'WALLET_TRANSFER_OUT',
    'WALLET_TRANSFER_IN',
    'INVESTMENT_OUTFLOW',
    'INVESTMENT_RETURN',
    'REFUND',
    'SECURITY_DEPOSIT',
    'REVERSAL'
);

CREATE TYPE entry_direction AS ENUM ('INFLOW', 'OUTFLOW');

CREATE TYPE reference_type AS ENUM (
    'FEE_PAYMENT',
    'EXPENSE',
    'SALARY_SLIP',
    'LEDGER_ENTRY',
    'INVESTMENT',
    'INVESTMENT_RETURN',
    'REFUND',
    'SECURITY_DEPOSIT'
);
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    kind wallet_kind NOT NULL,
    currency VARCHAR(3) NOT NULL,
    current_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_wallets_name UNIQUE (name),
    CONSTRAINT chk_wallet_balance_non_negative CHECK (current_balance >= 0)
);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    tx_type tx_type NOT NULL,
    direction entry_direction NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    entry_date DATE NOT NULL,
    reference_type reference_type NOT NULL,
    reference_id UUID NOT NULL,
    reference_code VARCHAR(32),
    performed_by UUID NOT NULL,
    is_reversed BOOLEAN NOT NULL DEFAULT false,
    reversal_of UUID REFERENCES ledger_entries(id),
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_entry_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_reversal_link CHECK (
        (tx_type = 'REVERSAL') = (reversal_of IS NOT NULL)
    )
);

-- Wallet history (most common read)
CREATE INDEX idx_ledger_entries_wallet ON ledger_entries(wallet_id, created_at DESC);

-- Document lookup
CREATE INDEX idx_ledger_entries_reference ON ledger_entries(reference_type, reference_id);

-- At most one compensating entry per original
CREATE UNIQUE INDEX uq_ledger_entries_reversal_of ON ledger_entries(reversal_of)
    WHERE reversal_of IS NOT NULL;
";

const ADVANCE_SQL: &str = r"
CREATE TABLE student_advance_balances (
    student_id UUID PRIMARY KEY,
    balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    last_updated TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_advance_non_negative CHECK (balance >= 0)
);
";

const PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_locked BOOLEAN NOT NULL DEFAULT false,
    locked_by UUID,
    locked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (start_date <= end_date),
    CONSTRAINT excl_accounting_period_overlap
        EXCLUDE USING gist ((daterange(start_date, end_date, '[]')) WITH &&)
);

CREATE INDEX idx_accounting_periods_range ON accounting_periods(start_date, end_date);
";

const AUDIT_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    action VARCHAR(64) NOT NULL,
    entity_type VARCHAR(64) NOT NULL,
    entity_id UUID NOT NULL,
    reference VARCHAR(255),
    performed_by UUID NOT NULL,
    performed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    previous_state JSONB,
    new_state JSONB
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity_type, entity_id, performed_at);
";

const SEQUENCE_SQL: &str = r"
CREATE TABLE sequence_counters (
    prefix VARCHAR(8) NOT NULL,
    scope_year INTEGER NOT NULL,
    last_value BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (prefix, scope_year),
    CONSTRAINT chk_sequence_positive CHECK (last_value > 0)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS sequence_counters CASCADE;
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS student_advance_balances CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;

DROP TYPE IF EXISTS reference_type;
DROP TYPE IF EXISTS entry_direction;
DROP TYPE IF EXISTS tx_type;
DROP TYPE IF EXISTS wallet_kind;
";
