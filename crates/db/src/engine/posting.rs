//! Single-wallet postings.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
};
use tracing::info;
use uuid::Uuid;

use bursary_core::audit::AuditAction;
use bursary_core::ledger::{
    ExpenseRequest, InvestmentRequest, InvestmentReturnRequest, LedgerError, LedgerRequest,
    PostingResult, ReferenceType, RefundRequest, SalaryDisbursementRequest,
    SecurityDepositRequest, signed_delta,
};
use bursary_core::sequence::SequencePrefix;
use bursary_shared::types::{
    ExpenseId, InvestmentId, InvestmentReturnId, LedgerEntryId, RefundId, SecurityDepositId,
    WalletId,
};

use super::{Committed, LedgerEngine, Scoped};
use crate::entities::sea_orm_active_enums::{
    DepositStatus, ExpenseStatus, InvestmentStatus, PostingStatus, RefundStatus, SlipStatus,
    enum_expr,
};
use crate::entities::{
    expenses, investment_returns, investments, ledger_entries, refunds, salary_slips,
    security_deposits,
};
use crate::error::db_err;
use crate::repositories::NewEntry;

impl LedgerEngine {
    /// Adjusts the wallet and inserts the entry for a single-wallet posting.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn post_leg(
        &self,
        txn: &DatabaseTransaction,
        request: &impl LedgerRequest,
        wallet_id: WalletId,
        amount: Decimal,
        reference_id: Uuid,
        reference_code: &str,
        notes: Option<String>,
    ) -> Result<ledger_entries::Model, LedgerError> {
        let tx_type = request.tx_type();
        let (Some(direction), Some(reference_type)) =
            (tx_type.natural_direction(), ReferenceType::for_tx_type(tx_type))
        else {
            return Err(LedgerError::Internal(format!(
                "{tx_type} cannot be posted as a single leg"
            )));
        };

        self.wallets
            .adjust_balance(txn, wallet_id, signed_delta(direction, amount))
            .await?;

        self.entries
            .insert(
                txn,
                NewEntry {
                    id: LedgerEntryId::new(),
                    tx_type,
                    direction,
                    amount,
                    wallet_id,
                    entry_date: request.effective_date(),
                    reference_type,
                    reference_id,
                    reference_code: Some(reference_code.to_string()),
                    performed_by: request.performed_by(),
                    reversal_of: None,
                    notes,
                },
            )
            .await
    }

    // ========== Expense ==========

    /// Pays an operating expense from a wallet.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, an inactive wallet or
    /// category; `PeriodLocked`; or `InsufficientFunds`.
    pub async fn record_expense(
        &self,
        request: &ExpenseRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;
        if !self.lookup.category_is_active(request.category_id).await? {
            return Err(LedgerError::CategoryInactive(request.category_id.into_inner()));
        }
        self.periods.assert_not_locked(request.expense_date).await?;

        let this = self;
        let committed = self
            .run_scope("record_expense", move || this.expense_scope(request))
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            "expense posted"
        );
        Ok(self
            .finish(committed, AuditAction::ExpenseRecorded, "expense", request.performed_by)
            .await)
    }

    async fn expense_scope(
        &self,
        request: &ExpenseRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::Expense, request.expense_date.year())
            .await?;

        let expense_id = ExpenseId::new().into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                expense_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let expense = expenses::ActiveModel {
            id: Set(expense_id),
            expense_number: Set(code.clone()),
            category_id: Set(request.category_id.into_inner()),
            wallet_id: Set(request.wallet_id.into_inner()),
            payee: Set(request.payee.trim().to_string()),
            amount: Set(request.amount),
            expense_date: Set(request.expense_date),
            status: Set(ExpenseStatus::Paid),
            transaction_id: Set(entry.id),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                expense_id,
                code,
                &expense,
            ),
        ))
    }

    // ========== Payroll ==========

    /// Pays a pending salary slip in full.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, `SlipAlreadyPaid`, `SalaryAmountMismatch`,
    /// `PeriodLocked` or `InsufficientFunds`.
    pub async fn disburse_salary(
        &self,
        request: &SalaryDisbursementRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;

        let slip_id = request.slip_id.into_inner();
        let slip = salary_slips::Entity::find_by_id(slip_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::DocumentNotFound {
                kind: "Salary slip",
                id: slip_id,
            })?;
        if slip.status == SlipStatus::Paid {
            return Err(LedgerError::SlipAlreadyPaid(slip_id));
        }
        if slip.net_pay != request.amount {
            return Err(LedgerError::SalaryAmountMismatch {
                expected: slip.net_pay,
                actual: request.amount,
            });
        }
        self.periods.assert_not_locked(request.payment_date).await?;

        let this = self;
        let committed = self
            .run_scope("disburse_salary", move || this.salary_scope(request))
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            slip_id = %slip_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            "salary disbursed"
        );
        Ok(self
            .finish(committed, AuditAction::SalaryDisbursed, "salary_slip", request.performed_by)
            .await)
    }

    async fn salary_scope(
        &self,
        request: &SalaryDisbursementRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::Payroll, request.payment_date.year())
            .await?;

        let slip_id = request.slip_id.into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                slip_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let updated = salary_slips::Entity::update_many()
            .col_expr(salary_slips::Column::Status, enum_expr(SlipStatus::Paid))
            .col_expr(salary_slips::Column::PaymentReference, Expr::value(code.clone()))
            .col_expr(
                salary_slips::Column::WalletId,
                Expr::value(request.wallet_id.into_inner()),
            )
            .col_expr(salary_slips::Column::PaidOn, Expr::value(request.payment_date))
            .col_expr(salary_slips::Column::TransactionId, Expr::value(entry.id))
            .col_expr(salary_slips::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(salary_slips::Column::Id.eq(slip_id))
            .filter(salary_slips::Column::Status.eq(SlipStatus::Pending))
            .filter(salary_slips::Column::NetPay.eq(request.amount))
            .exec_with_returning(&txn)
            .await
            .map_err(db_err)?;
        let Some(slip) = updated.into_iter().next() else {
            return Err(LedgerError::SlipAlreadyPaid(slip_id));
        };

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                slip_id,
                code,
                &slip,
            ),
        ))
    }

    // ========== Investments ==========

    /// Places principal into a new investment.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `PeriodLocked` or `InsufficientFunds`.
    pub async fn record_investment(
        &self,
        request: &InvestmentRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;
        self.periods.assert_not_locked(request.investment_date).await?;

        let this = self;
        let committed = self
            .run_scope("record_investment", move || this.investment_scope(request))
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            "investment posted"
        );
        Ok(self
            .finish(committed, AuditAction::InvestmentRecorded, "investment", request.performed_by)
            .await)
    }

    async fn investment_scope(
        &self,
        request: &InvestmentRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::Investment, request.investment_date.year())
            .await?;

        let investment_id = InvestmentId::new().into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                investment_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let now = Utc::now().into();
        let investment = investments::ActiveModel {
            id: Set(investment_id),
            investment_number: Set(code.clone()),
            wallet_id: Set(request.wallet_id.into_inner()),
            instrument: Set(request.instrument.trim().to_string()),
            principal: Set(request.amount),
            returned_amount: Set(Decimal::ZERO),
            investment_date: Set(request.investment_date),
            maturity_date: Set(request.maturity_date),
            status: Set(InvestmentStatus::Active),
            transaction_id: Set(entry.id),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                investment_id,
                code,
                &investment,
            ),
        ))
    }

    /// Posts income or principal returned from an active investment.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, `InvestmentNotActive` or `PeriodLocked`.
    pub async fn record_investment_return(
        &self,
        request: &InvestmentReturnRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;

        let investment_id = request.investment_id.into_inner();
        let investment = investments::Entity::find_by_id(investment_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::DocumentNotFound {
                kind: "Investment",
                id: investment_id,
            })?;
        if investment.status != InvestmentStatus::Active {
            return Err(LedgerError::InvestmentNotActive(investment_id));
        }
        self.periods.assert_not_locked(request.return_date).await?;

        let this = self;
        let committed = self
            .run_scope("record_investment_return", move || {
                this.investment_return_scope(request)
            })
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            investment_id = %investment_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            "investment return posted"
        );
        Ok(self
            .finish(
                committed,
                AuditAction::InvestmentReturnRecorded,
                "investment_return",
                request.performed_by,
            )
            .await)
    }

    async fn investment_return_scope(
        &self,
        request: &InvestmentReturnRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::InvestmentReturn, request.return_date.year())
            .await?;

        let return_id = InvestmentReturnId::new().into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                return_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let investment_id = request.investment_id.into_inner();
        let status = if request.close_investment {
            InvestmentStatus::Closed
        } else {
            InvestmentStatus::Active
        };
        let bumped = investments::Entity::update_many()
            .col_expr(
                investments::Column::ReturnedAmount,
                Expr::col(investments::Column::ReturnedAmount).add(request.amount),
            )
            .col_expr(investments::Column::Status, enum_expr(status))
            .col_expr(investments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(investments::Column::Id.eq(investment_id))
            .filter(investments::Column::Status.eq(InvestmentStatus::Active))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if bumped.rows_affected == 0 {
            return Err(LedgerError::InvestmentNotActive(investment_id));
        }

        let investment_return = investment_returns::ActiveModel {
            id: Set(return_id),
            return_number: Set(code.clone()),
            investment_id: Set(investment_id),
            wallet_id: Set(request.wallet_id.into_inner()),
            amount: Set(request.amount),
            return_date: Set(request.return_date),
            status: Set(PostingStatus::Posted),
            transaction_id: Set(entry.id),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                return_id,
                code,
                &investment_return,
            ),
        ))
    }

    // ========== Student money ==========

    /// Refunds money to a student, optionally drawing down their advance.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `PeriodLocked`, `InsufficientFunds` or
    /// `InsufficientAdvance`.
    pub async fn issue_refund(
        &self,
        request: &RefundRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;
        self.periods.assert_not_locked(request.refund_date).await?;

        let this = self;
        let committed = self
            .run_scope("issue_refund", move || this.refund_scope(request))
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            student_id = %request.student_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            from_advance = request.from_advance,
            "refund issued"
        );
        Ok(self
            .finish(committed, AuditAction::RefundIssued, "refund", request.performed_by)
            .await)
    }

    async fn refund_scope(
        &self,
        request: &RefundRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::Refund, request.refund_date.year())
            .await?;

        let refund_id = RefundId::new().into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                refund_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let refund = refunds::ActiveModel {
            id: Set(refund_id),
            refund_number: Set(code.clone()),
            student_id: Set(request.student_id.into_inner()),
            wallet_id: Set(request.wallet_id.into_inner()),
            amount: Set(request.amount),
            refund_date: Set(request.refund_date),
            from_advance: Set(request.from_advance),
            reason: Set(request.reason.trim().to_string()),
            status: Set(RefundStatus::Issued),
            transaction_id: Set(entry.id),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        if request.from_advance {
            let snapshot = self.advances.snapshot(&txn, request.student_id).await?;
            self.advances
                .apply_delta(&txn, &snapshot, -request.amount)
                .await?;
        }

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                refund_id,
                code,
                &refund,
            ),
        ))
    }

    /// Takes a refundable deposit from a student.
    ///
    /// # Errors
    ///
    /// Returns a validation error or `PeriodLocked`.
    pub async fn record_security_deposit(
        &self,
        request: &SecurityDepositRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        self.wallets.find_active(request.wallet_id).await?;
        self.periods.assert_not_locked(request.deposit_date).await?;

        let this = self;
        let committed = self
            .run_scope("record_security_deposit", move || this.deposit_scope(request))
            .await?;

        info!(
            wallet_id = %request.wallet_id,
            student_id = %request.student_id,
            entry_id = ?committed.result.primary_entry(),
            amount = %request.amount,
            "security deposit posted"
        );
        Ok(self
            .finish(
                committed,
                AuditAction::SecurityDepositRecorded,
                "security_deposit",
                request.performed_by,
            )
            .await)
    }

    async fn deposit_scope(
        &self,
        request: &SecurityDepositRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let code = self
            .sequences
            .next(&txn, SequencePrefix::SecurityDeposit, request.deposit_date.year())
            .await?;

        let deposit_id = SecurityDepositId::new().into_inner();
        let entry = self
            .post_leg(
                &txn,
                request,
                request.wallet_id,
                request.amount,
                deposit_id,
                &code,
                request.notes.clone(),
            )
            .await?;

        let deposit = security_deposits::ActiveModel {
            id: Set(deposit_id),
            deposit_number: Set(code.clone()),
            student_id: Set(request.student_id.into_inner()),
            wallet_id: Set(request.wallet_id.into_inner()),
            amount: Set(request.amount),
            deposit_date: Set(request.deposit_date),
            status: Set(DepositStatus::Held),
            transaction_id: Set(entry.id),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        Ok((
            txn,
            Committed::new(
                vec![LedgerEntryId::from_uuid(entry.id)],
                deposit_id,
                code,
                &deposit,
            ),
        ))
    }
}
