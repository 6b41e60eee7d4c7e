//! `SeaORM` Entity for fee_invoices table.
//!
//! Invoices are raised by the fee module. The ledger only moves
//! `amount_paid` and `status`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::InvoiceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    #[sea_orm(unique)]
    pub invoice_number: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount_due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub due_date: Date,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fee_payments::Entity")]
    FeePayments,
}

impl Related<super::fee_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeePayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
