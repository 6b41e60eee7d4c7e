//! Reversal of posted entries.
//!
//! The original stays untouched apart from its `is_reversed` flag. Each
//! reversed entry gets one compensating REVERSAL entry on the same wallet,
//! dated on the reversal day, and the domain document it evidences is
//! rolled back in the same scope.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use bursary_core::advance::{InvoiceStatus, unwind_fee_payment};
use bursary_core::audit::{AuditAction, NewAuditEntry};
use bursary_core::ledger::{
    LedgerError, ReversalPlan, ReversalRequest, ReversalResult, TxType, check_reversible,
    normalize_reason, plan_reversal,
};
use bursary_core::sequence::SequencePrefix;
use bursary_shared::types::{LedgerEntryId, StudentId};

use super::{LedgerEngine, Scoped};
use crate::entities::sea_orm_active_enums::{
    DepositStatus, ExpenseStatus, InvestmentStatus, InvoiceStatus as StoredInvoiceStatus,
    PostingStatus, ReferenceType, RefundStatus, SlipStatus, TransferStatus, enum_expr,
};
use crate::entities::{
    expenses, fee_invoices, fee_payments, investment_returns, investments, ledger_entries,
    refunds, salary_slips, security_deposits, wallet_transfers,
};
use crate::error::db_err;
use crate::repositories::NewEntry;
use crate::repositories::ledger_entry::reversible_entry;

fn missing(kind: &'static str, id: Uuid) -> LedgerError {
    LedgerError::DocumentNotFound { kind, id }
}

fn stale(what: &str, id: Uuid) -> LedgerError {
    LedgerError::ConcurrencyConflict(format!("{what} {id}"))
}

impl LedgerEngine {
    /// Reverses a posted entry, or both legs of a transfer.
    ///
    /// # Errors
    ///
    /// Returns `ReasonTooShort`, `EntryNotFound`, `AlreadyReversed`,
    /// `InvalidReversalTarget`, `PeriodLocked` for the reversal day,
    /// `InsufficientFunds` or `InsufficientAdvance`.
    pub async fn reverse(&self, request: &ReversalRequest) -> Result<ReversalResult, LedgerError> {
        let reason = normalize_reason(&request.reason, self.settings.min_reversal_reason_len)?;
        let original = self.entries.get(request.entry_id).await?;
        check_reversible(&reversible_entry(&original))?;

        let today = Utc::now().date_naive();
        self.periods.assert_not_locked(today).await?;

        let this = self;
        let reason = reason.as_str();
        let (mut result, snapshot) = self
            .run_scope("reverse", move || this.reversal_scope(request, reason, today))
            .await?;

        info!(
            entry_id = %request.entry_id,
            reversal_entry_ids = ?result.reversal_entry_ids,
            reference_code = %result.reference_code,
            "entry reversed"
        );

        let audit = NewAuditEntry::new(
            AuditAction::EntryReversed,
            "ledger_entry",
            request.entry_id.into_inner(),
            request.performed_by,
        )
        .with_reference(result.reference_code.clone())
        .with_states(serde_json::to_value(&original).ok(), Some(snapshot));
        self.record_audit(audit, &mut result.warnings).await;

        Ok(result)
    }

    async fn reversal_scope(
        &self,
        request: &ReversalRequest,
        reason: &str,
        today: NaiveDate,
    ) -> Result<Scoped<(ReversalResult, Value)>, LedgerError> {
        let txn = self.begin().await?;

        let target = self
            .entries
            .get_in(&txn, request.entry_id.into_inner())
            .await?;
        let sibling = if TxType::from(target.tx_type).is_transfer_leg() {
            Some(self.entries.get_in(&txn, target.reference_id).await?)
        } else {
            None
        };
        let plan = plan_reversal(
            &reversible_entry(&target),
            sibling.as_ref().map(reversible_entry).as_ref(),
        )?;

        let code = self
            .sequences
            .next(&txn, SequencePrefix::Reversal, today.year())
            .await?;
        self.wallets.lock_for_update(&txn, &plan.wallet_ids()).await?;

        let reversal_entries = self
            .post_reversal_legs(&txn, &plan, &target, request, reason, &code, today)
            .await?;
        self.undo_document(&txn, &target).await?;

        let snapshot = json!({ "reason": reason, "reversal_entries": reversal_entries });
        let result = ReversalResult {
            reversed_entry_ids: plan.legs.iter().map(|leg| leg.original_id).collect(),
            reversal_entry_ids: reversal_entries
                .iter()
                .map(|e| LedgerEntryId::from_uuid(e.id))
                .collect(),
            reference_code: code,
            warnings: Vec::new(),
        };
        Ok((txn, (result, snapshot)))
    }

    #[allow(clippy::too_many_arguments)]
    async fn post_reversal_legs(
        &self,
        txn: &DatabaseTransaction,
        plan: &ReversalPlan,
        target: &ledger_entries::Model,
        request: &ReversalRequest,
        reason: &str,
        code: &str,
        today: NaiveDate,
    ) -> Result<Vec<ledger_entries::Model>, LedgerError> {
        let mut posted = Vec::with_capacity(plan.legs.len());

        for leg in &plan.legs {
            self.entries.mark_reversed(txn, leg.original_id).await?;
            self.wallets
                .adjust_balance(txn, leg.wallet_id, leg.delta())
                .await?;

            // Both legs of a transfer reference each other, so each
            // reversal carries the reference of the leg it compensates.
            let reference_id = if leg.original_id.into_inner() == target.id {
                target.reference_id
            } else {
                target.id
            };
            let entry = self
                .entries
                .insert(
                    txn,
                    NewEntry {
                        id: LedgerEntryId::new(),
                        tx_type: TxType::Reversal,
                        direction: leg.direction,
                        amount: leg.amount,
                        wallet_id: leg.wallet_id,
                        entry_date: today,
                        reference_type: target.reference_type.into(),
                        reference_id,
                        reference_code: Some(code.to_string()),
                        performed_by: request.performed_by,
                        reversal_of: Some(leg.original_id),
                        notes: Some(reason.to_string()),
                    },
                )
                .await?;
            posted.push(entry);
        }

        Ok(posted)
    }

    /// Rolls back the document evidenced by `target`.
    async fn undo_document(
        &self,
        txn: &DatabaseTransaction,
        target: &ledger_entries::Model,
    ) -> Result<(), LedgerError> {
        let reference_id = target.reference_id;
        match target.reference_type {
            ReferenceType::FeePayment => self.undo_fee_payment(txn, reference_id).await,
            ReferenceType::Expense => {
                let updated = expenses::Entity::update_many()
                    .col_expr(expenses::Column::Status, enum_expr(ExpenseStatus::Voided))
                    .filter(expenses::Column::Id.eq(reference_id))
                    .filter(expenses::Column::Status.eq(ExpenseStatus::Paid))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                if updated.rows_affected == 0 {
                    return Err(missing("Expense", reference_id));
                }
                Ok(())
            }
            ReferenceType::SalarySlip => {
                let updated = salary_slips::Entity::update_many()
                    .col_expr(salary_slips::Column::Status, enum_expr(SlipStatus::Pending))
                    .col_expr(
                        salary_slips::Column::PaymentReference,
                        Expr::value(Option::<String>::None),
                    )
                    .col_expr(salary_slips::Column::WalletId, Expr::value(Option::<Uuid>::None))
                    .col_expr(
                        salary_slips::Column::PaidOn,
                        Expr::value(Option::<NaiveDate>::None),
                    )
                    .col_expr(
                        salary_slips::Column::TransactionId,
                        Expr::value(Option::<Uuid>::None),
                    )
                    .col_expr(salary_slips::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(salary_slips::Column::Id.eq(reference_id))
                    .filter(salary_slips::Column::Status.eq(SlipStatus::Paid))
                    .filter(salary_slips::Column::TransactionId.eq(target.id))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                if updated.rows_affected == 0 {
                    return Err(missing("Salary slip", reference_id));
                }
                Ok(())
            }
            ReferenceType::LedgerEntry => {
                let updated = wallet_transfers::Entity::update_many()
                    .col_expr(
                        wallet_transfers::Column::Status,
                        enum_expr(TransferStatus::Reversed),
                    )
                    .filter(
                        Condition::any()
                            .add(wallet_transfers::Column::OutEntryId.eq(target.id))
                            .add(wallet_transfers::Column::InEntryId.eq(target.id)),
                    )
                    .filter(wallet_transfers::Column::Status.eq(TransferStatus::Completed))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                if updated.rows_affected == 0 {
                    return Err(missing("Wallet transfer", target.id));
                }
                Ok(())
            }
            ReferenceType::Investment => self.cancel_investment(txn, reference_id).await,
            ReferenceType::InvestmentReturn => {
                self.undo_investment_return(txn, reference_id).await
            }
            ReferenceType::Refund => self.undo_refund(txn, reference_id).await,
            ReferenceType::SecurityDeposit => {
                let updated = security_deposits::Entity::update_many()
                    .col_expr(
                        security_deposits::Column::Status,
                        enum_expr(DepositStatus::Reversed),
                    )
                    .filter(security_deposits::Column::Id.eq(reference_id))
                    .filter(security_deposits::Column::Status.eq(DepositStatus::Held))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                if updated.rows_affected == 0 {
                    return Err(missing("Security deposit", reference_id));
                }
                Ok(())
            }
        }
    }

    async fn undo_fee_payment(
        &self,
        txn: &DatabaseTransaction,
        payment_id: Uuid,
    ) -> Result<(), LedgerError> {
        let payment = fee_payments::Entity::find_by_id(payment_id)
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| missing("Fee payment", payment_id))?;
        let invoice = fee_invoices::Entity::find_by_id(payment.invoice_id)
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| missing("Fee invoice", payment.invoice_id))?;

        let unwind = unwind_fee_payment(
            invoice.amount_due,
            invoice.amount_paid,
            payment.applied_to_invoice,
            payment.advance_applied,
            payment.excess_to_advance,
        );
        let status = match InvoiceStatus::from(invoice.status) {
            InvoiceStatus::Cancelled => invoice.status,
            _ => StoredInvoiceStatus::from(unwind.status),
        };

        let updated = fee_invoices::Entity::update_many()
            .col_expr(
                fee_invoices::Column::AmountPaid,
                Expr::value(unwind.new_amount_paid),
            )
            .col_expr(fee_invoices::Column::Status, enum_expr(status))
            .col_expr(fee_invoices::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(fee_invoices::Column::Id.eq(invoice.id))
            .filter(fee_invoices::Column::AmountPaid.eq(invoice.amount_paid))
            .exec(txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(stale("invoice", invoice.id));
        }

        let updated = fee_payments::Entity::update_many()
            .col_expr(
                fee_payments::Column::Status,
                enum_expr(PostingStatus::Reversed),
            )
            .filter(fee_payments::Column::Id.eq(payment_id))
            .filter(fee_payments::Column::Status.eq(PostingStatus::Posted))
            .exec(txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(stale("fee payment", payment_id));
        }

        let student_id = StudentId::from_uuid(payment.student_id);
        let advance = self.advances.snapshot(txn, student_id).await?;
        self.advances
            .apply_delta(txn, &advance, unwind.advance_delta)
            .await?;
        Ok(())
    }

    async fn cancel_investment(
        &self,
        txn: &DatabaseTransaction,
        investment_id: Uuid,
    ) -> Result<(), LedgerError> {
        let posted_returns = investment_returns::Entity::find()
            .filter(investment_returns::Column::InvestmentId.eq(investment_id))
            .filter(investment_returns::Column::Status.eq(PostingStatus::Posted))
            .count(txn)
            .await
            .map_err(db_err)?;
        if posted_returns > 0 {
            return Err(LedgerError::InvalidReversalTarget(format!(
                "investment {investment_id} has {posted_returns} posted return(s)"
            )));
        }

        let updated = investments::Entity::update_many()
            .col_expr(
                investments::Column::Status,
                enum_expr(InvestmentStatus::Cancelled),
            )
            .col_expr(investments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(investments::Column::Id.eq(investment_id))
            .filter(investments::Column::Status.eq(InvestmentStatus::Active))
            .exec(txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(LedgerError::InvestmentNotActive(investment_id));
        }
        Ok(())
    }

    async fn undo_investment_return(
        &self,
        txn: &DatabaseTransaction,
        return_id: Uuid,
    ) -> Result<(), LedgerError> {
        let updated = investment_returns::Entity::update_many()
            .col_expr(
                investment_returns::Column::Status,
                enum_expr(PostingStatus::Reversed),
            )
            .filter(investment_returns::Column::Id.eq(return_id))
            .filter(investment_returns::Column::Status.eq(PostingStatus::Posted))
            .exec_with_returning(txn)
            .await
            .map_err(db_err)?;
        let Some(investment_return) = updated.into_iter().next() else {
            return Err(missing("Investment return", return_id));
        };

        let investment_id = investment_return.investment_id;
        let updated = investments::Entity::update_many()
            .col_expr(
                investments::Column::ReturnedAmount,
                Expr::col(investments::Column::ReturnedAmount).sub(investment_return.amount),
            )
            .col_expr(investments::Column::Status, enum_expr(InvestmentStatus::Active))
            .col_expr(investments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(investments::Column::Id.eq(investment_id))
            .filter(investments::Column::ReturnedAmount.gte(investment_return.amount))
            .exec(txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(stale("investment", investment_id));
        }
        Ok(())
    }

    async fn undo_refund(
        &self,
        txn: &DatabaseTransaction,
        refund_id: Uuid,
    ) -> Result<(), LedgerError> {
        let updated = refunds::Entity::update_many()
            .col_expr(refunds::Column::Status, enum_expr(RefundStatus::Reversed))
            .filter(refunds::Column::Id.eq(refund_id))
            .filter(refunds::Column::Status.eq(RefundStatus::Issued))
            .exec_with_returning(txn)
            .await
            .map_err(db_err)?;
        let Some(refund) = updated.into_iter().next() else {
            return Err(missing("Refund", refund_id));
        };

        if refund.from_advance {
            let student_id = StudentId::from_uuid(refund.student_id);
            let advance = self.advances.snapshot(txn, student_id).await?;
            self.advances
                .apply_delta(txn, &advance, refund.amount)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stale_is_retryable() {
        assert!(stale("invoice", Uuid::nil()).is_retryable());
        assert!(!missing("Refund", Uuid::nil()).is_retryable());
    }

    #[test]
    fn test_unwind_restores_partial_invoice() {
        let unwind = unwind_fee_payment(dec!(10000), dec!(10000), dec!(4000), dec!(0), dec!(0));
        assert_eq!(unwind.new_amount_paid, dec!(6000));
        assert_eq!(unwind.status, InvoiceStatus::Partial);
        assert_eq!(unwind.advance_delta, Decimal::ZERO);
    }
}
