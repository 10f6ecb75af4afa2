use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::commission;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SaleStatus {
  #[sea_orm(string_value = "requested")]
  #[default]
  Requested,
  #[sea_orm(string_value = "offered")]
  Offered,
  #[sea_orm(string_value = "confirmed")]
  Confirmed,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

/// A certificate reservation moving through
/// requested -> offered -> confirmed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub buyer_user_id: i64,
  pub amount_micro: i64,
  pub weeks: i32,
  pub status: SaleStatus,
  pub created_at: DateTime,
  pub confirmed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "commission::Entity")]
  Commissions,
}

impl Related<commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commissions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
