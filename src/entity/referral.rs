use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::broker;

/// Directed edge from a referred user to the broker who referred them.
/// Level 1 is the direct referrer; levels 2 and 3 are the upline.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub referred_user_id: i64,
  pub broker_id: i64,
  pub level: i32,
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
