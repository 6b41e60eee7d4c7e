//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounting_periods;
pub mod audit_logs;
pub mod expense_categories;
pub mod expenses;
pub mod fee_invoices;
pub mod fee_payments;
pub mod investment_returns;
pub mod investments;
pub mod ledger_entries;
pub mod refunds;
pub mod salary_slips;
pub mod sea_orm_active_enums;
pub mod security_deposits;
pub mod sequence_counters;
pub mod student_advance_balances;
pub mod wallet_transfers;
pub mod wallets;
