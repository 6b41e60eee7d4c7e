//! `SeaORM` Entity for salary_slips table.
//!
//! Slips are created by payroll. Disbursement fills the payment fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SlipStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "salary_slips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub employee_id: Uuid,
    pub pay_period: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub net_pay: Decimal,
    pub status: SlipStatus,
    pub payment_reference: Option<String>,
    pub wallet_id: Option<Uuid>,
    pub paid_on: Option<Date>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
