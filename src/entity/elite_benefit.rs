use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::broker;

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BenefitType {
  #[sea_orm(string_value = "retirement_bonus")]
  RetirementBonus,
  #[sea_orm(string_value = "time_bonus")]
  TimeBonus,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BenefitStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "granted")]
  Granted,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "elite_benefits")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub broker_id: i64,
  pub property_id: String,
  pub benefit_type: BenefitType,
  pub ownership_bps: Option<i32>,
  pub weeks_bonus: Option<i32>,
  pub amount_micro: Option<i64>,
  pub status: BenefitStatus,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "broker::Entity",
    from = "Column::BrokerId",
    to = "broker::Column::UserId"
  )]
  Broker,
}

impl Related<broker::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Broker.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
