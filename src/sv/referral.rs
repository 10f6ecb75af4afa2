use crate::{
  entity::{broker, referral},
  prelude::*,
};

/// Referral edges are written once at signup and never mutated. The
/// chain is at most three levels deep; only level 1 earns commissions
/// under the current policy.
pub const MAX_REFERRAL_DEPTH: i32 = 3;

pub struct Referral<'a> {
  db: &'a DatabaseConnection,
}

#[allow(dead_code)]
impl<'a> Referral<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Attach `referred_user_id` to `broker_id` as a direct (level 1)
  /// referral, materializing upline edges while the chain continues.
  pub async fn attach(
    &self,
    referred_user_id: i64,
    broker_id: i64,
  ) -> Result<referral::Model> {
    if referred_user_id == broker_id {
      return Err(Error::InvalidArgs("Cannot refer yourself".into()));
    }

    let txn = self.db.begin().await?;

    broker::Entity::find_by_id(broker_id)
      .one(&txn)
      .await?
      .ok_or(Error::ReferrerNotFound)?;

    let existing = referral::Entity::find()
      .filter(referral::Column::ReferredUserId.eq(referred_user_id))
      .filter(referral::Column::Level.eq(1))
      .one(&txn)
      .await?;

    if existing.is_some() {
      return Err(Error::InvalidArgs("User already has a referrer".into()));
    }

    let now = Utc::now().naive_utc();

    let direct = referral::ActiveModel {
      id: NotSet,
      referred_user_id: Set(referred_user_id),
      broker_id: Set(broker_id),
      level: Set(1),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    // Walk the broker's own upline for the level 2 and 3 edges.
    let mut upline = broker_id;
    for level in 2..=MAX_REFERRAL_DEPTH {
      let Some(parent) = referral::Entity::find()
        .filter(referral::Column::ReferredUserId.eq(upline))
        .filter(referral::Column::Level.eq(1))
        .one(&txn)
        .await?
      else {
        break;
      };

      referral::ActiveModel {
        id: NotSet,
        referred_user_id: Set(referred_user_id),
        broker_id: Set(parent.broker_id),
        level: Set(level),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;

      upline = parent.broker_id;
    }

    txn.commit().await?;
    Ok(direct)
  }

  /// The broker who directly referred this user, if any. Absence is a
  /// normal outcome: most buyers arrive without a referral link.
  pub async fn direct_referrer_of(
    &self,
    user_id: i64,
  ) -> Result<Option<referral::Model>> {
    Ok(
      referral::Entity::find()
        .filter(referral::Column::ReferredUserId.eq(user_id))
        .filter(referral::Column::Level.eq(1))
        .one(self.db)
        .await?,
    )
  }

  pub async fn tree_for(&self, user_id: i64) -> Result<Vec<referral::Model>> {
    Ok(
      referral::Entity::find()
        .filter(referral::Column::ReferredUserId.eq(user_id))
        .order_by_asc(referral::Column::Level)
        .limit(MAX_REFERRAL_DEPTH as u64)
        .all(self.db)
        .await?,
    )
  }

  /// Direct affiliates recruited by this broker.
  pub async fn affiliates(&self, broker_id: i64) -> Result<u64> {
    Ok(
      referral::Entity::find()
        .filter(referral::Column::BrokerId.eq(broker_id))
        .filter(referral::Column::Level.eq(1))
        .count(self.db)
        .await?,
    )
  }
}
