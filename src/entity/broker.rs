use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{broker_level, commission, referral};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BrokerRole {
  #[sea_orm(string_value = "user")]
  #[default]
  User,
  #[sea_orm(string_value = "broker")]
  Broker,
  #[sea_orm(string_value = "admin")]
  Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "brokers")]
pub struct Model {
  /// Platform user id, assigned by the auth layer upstream.
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  pub display_name: Option<String>,
  pub role: BrokerRole,
  pub level_id: i32,
  pub total_weeks_sold: i32,
  pub total_commissions_micro: i64,
  pub bonuses_claimed: i32,
  pub reg_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "broker_level::Entity",
    from = "Column::LevelId",
    to = "broker_level::Column::Id"
  )]
  Level,
  #[sea_orm(has_many = "commission::Entity")]
  Commissions,
  #[sea_orm(has_many = "referral::Entity")]
  Referrals,
}

impl Related<broker_level::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Level.def()
  }
}

impl Related<commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commissions.def()
  }
}

impl Related<referral::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Referrals.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
