use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::broker;

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum LevelTag {
  #[sea_orm(string_value = "BROKER")]
  Broker,
  #[sea_orm(string_value = "SILVER_BROKER")]
  SilverBroker,
  #[sea_orm(string_value = "BROKER_ELITE")]
  BrokerElite,
}

/// Static tier reference data, seeded by migration.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "broker_levels")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub tag: LevelTag,
  pub display_name: String,
  pub rank: i32,
  pub direct_rate_bps: i32,
  pub min_weeks_sold: i32,
  pub min_affiliates: i32,
  pub retirement_bonus_bps: Option<i32>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "broker::Entity")]
  Brokers,
}

impl Related<broker::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Brokers.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
