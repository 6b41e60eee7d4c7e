//! Fee collection against invoices, with advance netting.

use chrono::{Datelike, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;

use bursary_core::advance::{InvoiceStatus, settle_fee_payment};
use bursary_core::audit::AuditAction;
use bursary_core::ledger::{FeePaymentRequest, LedgerError, LedgerRequest, PostingResult};
use bursary_core::sequence::SequencePrefix;
use bursary_shared::types::{FeePaymentId, LedgerEntryId, StudentId};

use super::{Committed, LedgerEngine, Scoped};
use crate::entities::sea_orm_active_enums::{
    InvoiceStatus as StoredInvoiceStatus, PostingStatus, enum_expr,
};
use crate::entities::{fee_invoices, fee_payments};
use crate::error::db_err;

fn not_payable(invoice: &fee_invoices::Model) -> LedgerError {
    LedgerError::InvoiceNotPayable {
        invoice_id: invoice.id,
        status: invoice.status.as_str().to_string(),
    }
}

impl LedgerEngine {
    /// Collects a fee payment into a wallet.
    ///
    /// The full cash amount enters the wallet. With `apply_advance`, the
    /// student's advance is drawn against the invoice first; cash beyond
    /// the outstanding amount is credited to the advance.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `DocumentNotFound`, `InvoiceNotPayable`,
    /// `WalletInactive` or `PeriodLocked`.
    pub async fn record_fee_payment(
        &self,
        request: &FeePaymentRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;

        let invoice = self.find_invoice(request).await?;
        if !InvoiceStatus::from(invoice.status).accepts_payment() {
            return Err(not_payable(&invoice));
        }
        self.periods.assert_not_locked(request.payment_date).await?;

        let this = self;
        let committed = self
            .run_scope("record_fee_payment", move || this.fee_payment_scope(request))
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            invoice_id = %request.invoice_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            "fee payment posted"
        );
        Ok(self
            .finish(committed, AuditAction::FeePaymentRecorded, "fee_payment", request.performed_by)
            .await)
    }

    async fn find_invoice(
        &self,
        request: &FeePaymentRequest,
    ) -> Result<fee_invoices::Model, LedgerError> {
        let invoice_id = request.invoice_id.into_inner();
        fee_invoices::Entity::find_by_id(invoice_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::DocumentNotFound {
                kind: "Fee invoice",
                id: invoice_id,
            })
    }

    async fn fee_payment_scope(
        &self,
        request: &FeePaymentRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::Receipt, request.payment_date.year())
            .await?;

        let invoice_id = request.invoice_id.into_inner();
        let invoice = fee_invoices::Entity::find_by_id(invoice_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::DocumentNotFound {
                kind: "Fee invoice",
                id: invoice_id,
            })?;
        if !InvoiceStatus::from(invoice.status).accepts_payment() {
            return Err(not_payable(&invoice));
        }

        let payment_id = FeePaymentId::new().into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                payment_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let student_id = StudentId::from_uuid(invoice.student_id);
        let advance = self.advances.snapshot(&txn, student_id).await?;
        let settlement = settle_fee_payment(
            invoice.amount_due,
            invoice.amount_paid,
            request.amount,
            advance.balance,
            request.apply_advance,
        );

        let payment = fee_payments::ActiveModel {
            id: Set(payment_id),
            receipt_number: Set(code.clone()),
            invoice_id: Set(invoice_id),
            student_id: Set(invoice.student_id),
            wallet_id: Set(request.wallet_id.into_inner()),
            amount_received: Set(request.amount),
            advance_applied: Set(settlement.advance_applied),
            applied_to_invoice: Set(settlement.applied_to_invoice),
            excess_to_advance: Set(settlement.excess_to_advance),
            payment_date: Set(request.payment_date),
            status: Set(PostingStatus::Posted),
            transaction_id: Set(entry.id),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        // Conditional on the paid amount read above.
        let updated = fee_invoices::Entity::update_many()
            .col_expr(
                fee_invoices::Column::AmountPaid,
                Expr::value(settlement.new_amount_paid),
            )
            .col_expr(
                fee_invoices::Column::Status,
                enum_expr(StoredInvoiceStatus::from(settlement.status)),
            )
            .col_expr(fee_invoices::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(fee_invoices::Column::Id.eq(invoice_id))
            .filter(fee_invoices::Column::AmountPaid.eq(invoice.amount_paid))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(LedgerError::ConcurrencyConflict(format!("invoice {invoice_id}")));
        }

        self.advances
            .apply_delta(&txn, &advance, settlement.advance_delta())
            .await?;

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                payment_id,
                code,
                &payment,
            ),
        ))
    }
}
