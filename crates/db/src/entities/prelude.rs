//! Re-exports of every entity type.

pub use super::accounting_periods::Entity as AccountingPeriods;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::expense_categories::Entity as ExpenseCategories;
pub use super::expenses::Entity as Expenses;
pub use super::fee_invoices::Entity as FeeInvoices;
pub use super::fee_payments::Entity as FeePayments;
pub use super::investment_returns::Entity as InvestmentReturns;
pub use super::investments::Entity as Investments;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::refunds::Entity as Refunds;
pub use super::salary_slips::Entity as SalarySlips;
pub use super::security_deposits::Entity as SecurityDeposits;
pub use super::sequence_counters::Entity as SequenceCounters;
pub use super::student_advance_balances::Entity as StudentAdvanceBalances;
pub use super::wallet_transfers::Entity as WalletTransfers;
pub use super::wallets::Entity as Wallets;
