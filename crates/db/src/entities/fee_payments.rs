//! `SeaORM` Entity for fee_payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PostingStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub receipt_number: String,
    pub invoice_id: Uuid,
    pub student_id: Uuid,
    pub wallet_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount_received: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub advance_applied: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub applied_to_invoice: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub excess_to_advance: Decimal,
    pub payment_date: Date,
    pub status: PostingStatus,
    pub transaction_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub performed_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fee_invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::fee_invoices::Column::Id"
    )]
    FeeInvoices,
}

impl Related<super::fee_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
