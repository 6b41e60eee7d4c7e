//! Domain documents evidenced by ledger entries.
//!
//! Every document carries its minted reference code under a UNIQUE
//! constraint and the id of the entry that evidences it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(FEES_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(PAYROLL_SQL).await?;
        db.execute_unprepared(TRANSFERS_SQL).await?;
        db.execute_unprepared(INVESTMENTS_SQL).await?;
        db.execute_unprepared(STUDENT_MONEY_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE invoice_status AS ENUM ('UNPAID', 'PARTIAL', 'PAID', 'CANCELLED');
CREATE TYPE posting_status AS ENUM ('POSTED', 'REVERSED');
CREATE TYPE expense_status AS ENUM ('PAID', 'VOIDED');
CREATE TYPE slip_status AS ENUM ('PENDING', 'PAID');
CREATE TYPE transfer_status AS ENUM ('COMPLETED', 'REVERSED');
CREATE TYPE investment_status AS ENUM ('ACTIVE', 'CLOSED', 'CANCELLED');
CREATE TYPE refund_status AS ENUM ('ISSUED', 'REVERSED');
CREATE TYPE deposit_status AS ENUM ('HELD', 'REVERSED');
";

const FEES_SQL: &str = r"
CREATE TABLE fee_invoices (
    id UUID PRIMARY KEY,
    student_id UUID NOT NULL,
    invoice_number VARCHAR(32) NOT NULL,
    amount_due NUMERIC(19, 2) NOT NULL,
    amount_paid NUMERIC(19, 2) NOT NULL DEFAULT 0,
    status invoice_status NOT NULL DEFAULT 'UNPAID',
    due_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_fee_invoices_number UNIQUE (invoice_number),
    CONSTRAINT chk_invoice_amounts CHECK (amount_due > 0 AND amount_paid >= 0)
);

CREATE INDEX idx_fee_invoices_student ON fee_invoices(student_id);

CREATE TABLE fee_payments (
    id UUID PRIMARY KEY,
    receipt_number VARCHAR(32) NOT NULL,
    invoice_id UUID NOT NULL REFERENCES fee_invoices(id),
    student_id UUID NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    amount_received NUMERIC(19, 2) NOT NULL,
    advance_applied NUMERIC(19, 2) NOT NULL DEFAULT 0,
    applied_to_invoice NUMERIC(19, 2) NOT NULL,
    excess_to_advance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    payment_date DATE NOT NULL,
    status posting_status NOT NULL DEFAULT 'POSTED',
    transaction_id UUID NOT NULL REFERENCES ledger_entries(id),
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_fee_payments_receipt UNIQUE (receipt_number)
);

CREATE INDEX idx_fee_payments_invoice ON fee_payments(invoice_id);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expense_categories (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_expense_categories_name UNIQUE (name)
);

CREATE TABLE expenses (
    id UUID PRIMARY KEY,
    expense_number VARCHAR(32) NOT NULL,
    category_id UUID NOT NULL REFERENCES expense_categories(id),
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    payee VARCHAR(255) NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    expense_date DATE NOT NULL,
    status expense_status NOT NULL DEFAULT 'PAID',
    transaction_id UUID NOT NULL REFERENCES ledger_entries(id),
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_expenses_number UNIQUE (expense_number)
);
";

const PAYROLL_SQL: &str = r"
CREATE TABLE salary_slips (
    id UUID PRIMARY KEY,
    employee_id UUID NOT NULL,
    pay_period VARCHAR(32) NOT NULL,
    net_pay NUMERIC(19, 2) NOT NULL,
    status slip_status NOT NULL DEFAULT 'PENDING',
    payment_reference VARCHAR(32),
    wallet_id UUID REFERENCES wallets(id),
    paid_on DATE,
    transaction_id UUID REFERENCES ledger_entries(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_salary_slips_payment_reference UNIQUE (payment_reference),
    CONSTRAINT chk_slip_net_pay CHECK (net_pay > 0)
);

CREATE INDEX idx_salary_slips_employee ON salary_slips(employee_id, pay_period);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE wallet_transfers (
    id UUID PRIMARY KEY,
    transfer_number VARCHAR(32) NOT NULL,
    from_wallet_id UUID NOT NULL REFERENCES wallets(id),
    to_wallet_id UUID NOT NULL REFERENCES wallets(id),
    amount NUMERIC(19, 2) NOT NULL,
    transfer_date DATE NOT NULL,
    out_entry_id UUID NOT NULL REFERENCES ledger_entries(id),
    in_entry_id UUID NOT NULL REFERENCES ledger_entries(id),
    status transfer_status NOT NULL DEFAULT 'COMPLETED',
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_wallet_transfers_number UNIQUE (transfer_number),
    CONSTRAINT chk_transfer_distinct_wallets CHECK (from_wallet_id <> to_wallet_id)
);
";

const INVESTMENTS_SQL: &str = r"
CREATE TABLE investments (
    id UUID PRIMARY KEY,
    investment_number VARCHAR(32) NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    instrument VARCHAR(255) NOT NULL,
    principal NUMERIC(19, 2) NOT NULL,
    returned_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    investment_date DATE NOT NULL,
    maturity_date DATE,
    status investment_status NOT NULL DEFAULT 'ACTIVE',
    transaction_id UUID NOT NULL REFERENCES ledger_entries(id),
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_investments_number UNIQUE (investment_number),
    CONSTRAINT chk_investment_returned CHECK (returned_amount >= 0)
);

CREATE TABLE investment_returns (
    id UUID PRIMARY KEY,
    return_number VARCHAR(32) NOT NULL,
    investment_id UUID NOT NULL REFERENCES investments(id),
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    amount NUMERIC(19, 2) NOT NULL,
    return_date DATE NOT NULL,
    status posting_status NOT NULL DEFAULT 'POSTED',
    transaction_id UUID NOT NULL REFERENCES ledger_entries(id),
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_investment_returns_number UNIQUE (return_number)
);

CREATE INDEX idx_investment_returns_investment ON investment_returns(investment_id);
";

const STUDENT_MONEY_SQL: &str = r"
CREATE TABLE refunds (
    id UUID PRIMARY KEY,
    refund_number VARCHAR(32) NOT NULL,
    student_id UUID NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    amount NUMERIC(19, 2) NOT NULL,
    refund_date DATE NOT NULL,
    from_advance BOOLEAN NOT NULL DEFAULT false,
    reason TEXT NOT NULL,
    status refund_status NOT NULL DEFAULT 'ISSUED',
    transaction_id UUID NOT NULL REFERENCES ledger_entries(id),
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_refunds_number UNIQUE (refund_number)
);

CREATE TABLE security_deposits (
    id UUID PRIMARY KEY,
    deposit_number VARCHAR(32) NOT NULL,
    student_id UUID NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    amount NUMERIC(19, 2) NOT NULL,
    deposit_date DATE NOT NULL,
    status deposit_status NOT NULL DEFAULT 'HELD',
    transaction_id UUID NOT NULL REFERENCES ledger_entries(id),
    notes TEXT,
    performed_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_security_deposits_number UNIQUE (deposit_number)
);

CREATE INDEX idx_refunds_student ON refunds(student_id);
CREATE INDEX idx_security_deposits_student ON security_deposits(student_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS security_deposits CASCADE;
DROP TABLE IF EXISTS refunds CASCADE;
DROP TABLE IF EXISTS investment_returns CASCADE;
DROP TABLE IF EXISTS investments CASCADE;
DROP TABLE IF EXISTS wallet_transfers CASCADE;
DROP TABLE IF EXISTS salary_slips CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS expense_categories CASCADE;
DROP TABLE IF EXISTS fee_payments CASCADE;
DROP TABLE IF EXISTS fee_invoices CASCADE;

DROP TYPE IF EXISTS deposit_status;
DROP TYPE IF EXISTS refund_status;
DROP TYPE IF EXISTS investment_status;
DROP TYPE IF EXISTS transfer_status;
DROP TYPE IF EXISTS slip_status;
DROP TYPE IF EXISTS expense_status;
DROP TYPE IF EXISTS posting_status;
DROP TYPE IF EXISTS invoice_status;
";
