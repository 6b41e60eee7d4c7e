//! `SeaORM` Entity for investments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::InvestmentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "investments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub investment_number: String,
    pub wallet_id: Uuid,
    pub instrument: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub principal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub returned_amount: Decimal,
    pub investment_date: Date,
    pub maturity_date: Option<Date>,
    pub status: InvestmentStatus,
    pub transaction_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub performed_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::investment_returns::Entity")]
    InvestmentReturns,
}

impl Related<super::investment_returns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvestmentReturns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
