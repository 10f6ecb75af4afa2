use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{broker, broker_level::LevelTag, sale};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum CommissionStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "available")]
  Available,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

/// One commission attribution per sale. Immutable after creation apart
/// from the status transition pending -> available -> paid.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub broker_id: i64,
  pub sale_id: String,
  pub sale_amount_micro: i64,
  pub rate_bps: i32,
  pub amount_micro: i64,
  pub referral_level: i32,
  /// Tier the broker held when the commission was calculated.
  pub level_tag: Option<LevelTag>,
  pub status: CommissionStatus,
  pub hold_until: DateTime,
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
  #[sea_orm(
    belongs_to = "sale::Entity",
    from = "Column::SaleId",
    to = "sale::Column::Id"
  )]
  Sale,
}

impl Related<broker::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Broker.def()
  }
}

impl Related<sale::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sale.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
