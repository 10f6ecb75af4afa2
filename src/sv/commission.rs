use crate::{
  entity::{
    CommissionStatus, LevelTag, broker, broker_level, commission, sale,
  },
  prelude::*,
  sv,
  sv::level::LevelUpdate,
  utils::format_usdc,
};

/// 1 USDC = 1,000,000 microUSDC (USDC uses 6 decimal places)
pub const MICRO_USDC: i64 = 1_000_000;

/// Direct rate applied when the referrer has no tier row (4%)
pub const DEFAULT_DIRECT_RATE_BPS: i32 = 400;

/// Upline rates for referral levels 2 and 3. Declared alongside the
/// referral tree, but the current policy pays level 1 only.
#[allow(dead_code)]
pub const LEVEL_2_RATE_BPS: i32 = 100;
#[allow(dead_code)]
pub const LEVEL_3_RATE_BPS: i32 = 50;

/// Days a commission stays pending before it can be paid out.
pub const DEFAULT_HOLD_DAYS: i64 = 45;

pub struct Commission<'a> {
  db: &'a DatabaseConnection,
  hold_days: i64,
}

/// The sale facts the calculator needs, detached from the sale row so
/// callers without a persisted sale (previews, backfills) can use it.
#[derive(Debug, Clone)]
pub struct SaleInput {
  pub sale_id: String,
  pub buyer_user_id: i64,
  pub amount_micro: i64,
  pub weeks: i32,
}

impl From<&sale::Model> for SaleInput {
  fn from(sale: &sale::Model) -> Self {
    Self {
      sale_id: sale.id.clone(),
      buyer_user_id: sale.buyer_user_id,
      amount_micro: sale.amount_micro,
      weeks: sale.weeks,
    }
  }
}

#[derive(Debug, Clone)]
pub struct CommissionShare {
  pub broker_id: i64,
  pub level: i32,
  pub rate_bps: i32,
  pub amount_micro: i64,
  pub level_tag: Option<LevelTag>,
}

/// Outcome of the tier re-evaluation that follows commission recording.
/// A failure here never unwinds the recorded commissions.
#[derive(Debug)]
pub enum LevelOutcome {
  /// No commission was paid, so there was no broker to re-evaluate.
  Skipped,
  Updated(LevelUpdate),
  Failed(String),
}

#[derive(Debug)]
pub struct SaleCommissions {
  pub commissions: Vec<commission::Model>,
  pub level: LevelOutcome,
}

#[allow(dead_code)]
impl<'a> Commission<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db, hold_days: DEFAULT_HOLD_DAYS }
  }

  pub fn with_hold_days(db: &'a DatabaseConnection, hold_days: i64) -> Self {
    Self { db, hold_days }
  }

  /// Determine who earns a commission on a sale. At most one share is
  /// returned: the buyer's direct (level 1) referrer. A buyer without
  /// a referrer is a normal empty result.
  pub async fn calculate(
    &self,
    sale: &SaleInput,
  ) -> Result<Vec<CommissionShare>> {
    if sale.amount_micro <= 0 {
      return Err(Error::InvalidArgs("Sale amount must be positive".into()));
    }

    let Some(edge) = sv::Referral::new(self.db)
      .direct_referrer_of(sale.buyer_user_id)
      .await?
    else {
      debug!("no direct referrer for buyer {}", sale.buyer_user_id);
      return Ok(vec![]);
    };

    let broker = broker::Entity::find_by_id(edge.broker_id)
      .one(self.db)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    let level =
      broker_level::Entity::find_by_id(broker.level_id).one(self.db).await?;

    let rate_bps =
      level.as_ref().map_or(DEFAULT_DIRECT_RATE_BPS, |l| l.direct_rate_bps);
    let amount_micro = sale.amount_micro * rate_bps as i64 / 10_000;

    Ok(vec![CommissionShare {
      broker_id: broker.user_id,
      level: 1,
      rate_bps,
      amount_micro,
      level_tag: level.map(|l| l.tag),
    }])
  }

  /// Persist shares as pending commission records and advance the
  /// rewarded broker's lifetime counters, atomically.
  pub async fn record(
    &self,
    sale: &SaleInput,
    shares: &[CommissionShare],
  ) -> Result<Vec<commission::Model>> {
    let txn = self.db.begin().await?;
    let now = Utc::now().naive_utc();
    let hold_until = now + TimeDelta::days(self.hold_days);

    let mut recorded = Vec::with_capacity(shares.len());

    for share in shares {
      let broker = broker::Entity::find_by_id(share.broker_id)
        .one(&txn)
        .await?
        .ok_or(Error::BrokerNotFound)?;

      let model = commission::ActiveModel {
        id: NotSet,
        broker_id: Set(share.broker_id),
        sale_id: Set(sale.sale_id.clone()),
        sale_amount_micro: Set(sale.amount_micro),
        rate_bps: Set(share.rate_bps),
        amount_micro: Set(share.amount_micro),
        referral_level: Set(share.level),
        level_tag: Set(share.level_tag.clone()),
        status: Set(CommissionStatus::Pending),
        hold_until: Set(hold_until),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;

      // Only direct sales advance the lifetime counters
      if share.level == 1 {
        broker::ActiveModel {
          total_weeks_sold: Set(broker.total_weeks_sold + sale.weeks),
          total_commissions_micro: Set(
            broker.total_commissions_micro + share.amount_micro,
          ),
          ..broker.into()
        }
        .update(&txn)
        .await?;
      }

      info!(
        "commission recorded: broker {} earns {} USDC on sale {}",
        share.broker_id,
        format_usdc(share.amount_micro),
        sale.sale_id
      );

      recorded.push(model);
    }

    txn.commit().await?;
    Ok(recorded)
  }

  /// Full pipeline for a confirmed sale: calculate, record, then
  /// re-evaluate the seller's tier. The tier step is best-effort; its
  /// failure is carried in the result instead of propagated so a level
  /// bug cannot block commission recording.
  pub async fn process_for_sale(
    &self,
    sale: &SaleInput,
  ) -> Result<SaleCommissions> {
    let shares = self.calculate(sale).await?;

    if shares.is_empty() {
      info!("no commissions to process for sale {}", sale.sale_id);
      return Ok(SaleCommissions {
        commissions: vec![],
        level: LevelOutcome::Skipped,
      });
    }

    let commissions = self.record(sale, &shares).await?;

    let level = match shares.iter().find(|share| share.level == 1) {
      None => LevelOutcome::Skipped,
      Some(share) => {
        match sv::Level::new(self.db).update_level(share.broker_id).await {
          Ok(update) => LevelOutcome::Updated(update),
          Err(err) => {
            error!(
              "level update failed for broker {} after sale {}: {err}",
              share.broker_id, sale.sale_id
            );
            LevelOutcome::Failed(err.to_string())
          }
        }
      }
    };

    Ok(SaleCommissions { commissions, level })
  }

  pub async fn by_broker(
    &self,
    broker_id: i64,
  ) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::BrokerId.eq(broker_id))
        .order_by_desc(commission::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Flip pending commissions whose hold period has passed.
  pub async fn release_due(&self, now: DateTime) -> Result<u64> {
    use sea_orm::sea_query::Expr;

    let result = commission::Entity::update_many()
      .col_expr(
        commission::Column::Status,
        Expr::value(CommissionStatus::Available),
      )
      .filter(commission::Column::Status.eq(CommissionStatus::Pending))
      .filter(commission::Column::HoldUntil.lte(now))
      .exec(self.db)
      .await?;

    Ok(result.rows_affected)
  }

  pub async fn mark_paid(&self, id: i32) -> Result<commission::Model> {
    let model = commission::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::CommissionNotFound)?;

    if model.status != CommissionStatus::Available {
      return Err(Error::InvalidArgs("Commission is not payable yet".into()));
    }

    Ok(
      commission::ActiveModel {
        status: Set(CommissionStatus::Paid),
        ..model.into()
      }
      .update(self.db)
      .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{self, test_utils::test_db};

  fn sale_of(buyer: i64, usdc: i64, weeks: i32) -> SaleInput {
    SaleInput {
      sale_id: format!("sale-{buyer}-{usdc}"),
      buyer_user_id: buyer,
      amount_micro: usdc * MICRO_USDC,
      weeks,
    }
  }

  /// Persists a sale row so recorded commissions satisfy the foreign
  /// key, and hands back its input facts.
  async fn persisted_sale(
    db: &DatabaseConnection,
    buyer: i64,
    usdc: i64,
    weeks: i32,
  ) -> SaleInput {
    let sale = sv::Sale::new(db)
      .create(buyer, usdc * MICRO_USDC, weeks)
      .await
      .unwrap();
    SaleInput::from(&sale)
  }

  #[tokio::test]
  async fn test_no_referrer_means_no_commission() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let sv = Commission::new(&db);
    let shares = sv.calculate(&sale_of(10, 10_000, 1)).await.unwrap();
    assert!(shares.is_empty());

    let outcome = sv.process_for_sale(&sale_of(10, 10_000, 1)).await.unwrap();
    assert!(outcome.commissions.is_empty());
    assert!(matches!(outcome.level, LevelOutcome::Skipped));

    // Nothing was written
    let count = commission::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
  }

  #[tokio::test]
  async fn test_direct_referrer_earns_four_percent() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let shares = Commission::new(&db)
      .calculate(&sale_of(10, 10_000, 1))
      .await
      .unwrap();

    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].broker_id, 1);
    assert_eq!(shares[0].level, 1);
    assert_eq!(shares[0].rate_bps, 400);
    assert_eq!(shares[0].amount_micro, 400 * MICRO_USDC);
    assert_eq!(shares[0].level_tag, Some(LevelTag::Broker));
  }

  #[tokio::test]
  async fn test_tier_rate_applies_to_direct_commission() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let broker = sv::Broker::new(&db).get_or_create(1).await.unwrap();
    broker::ActiveModel { level_id: Set(2), ..broker.into() }
      .update(&db)
      .await
      .unwrap();

    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let shares = Commission::new(&db)
      .calculate(&sale_of(10, 10_000, 1))
      .await
      .unwrap();

    assert_eq!(shares[0].rate_bps, 500);
    assert_eq!(shares[0].amount_micro, 500 * MICRO_USDC);
    assert_eq!(shares[0].level_tag, Some(LevelTag::SilverBroker));
  }

  #[tokio::test]
  async fn test_rejects_non_positive_amount() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let result = Commission::new(&db).calculate(&sale_of(10, 0, 1)).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_record_advances_lifetime_counters() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let sale = persisted_sale(&db, 10, 5_000, 2).await;
    let sv = Commission::new(&db);
    let shares = sv.calculate(&sale).await.unwrap();
    let recorded = sv.record(&sale, &shares).await.unwrap();

    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].status, CommissionStatus::Pending);
    assert_eq!(recorded[0].referral_level, 1);
    assert_eq!(recorded[0].amount_micro, 200 * MICRO_USDC);

    let broker = broker::Entity::find_by_id(1i64).one(&db).await.unwrap().unwrap();
    assert_eq!(broker.total_weeks_sold, 2);
    assert_eq!(broker.total_commissions_micro, 200 * MICRO_USDC);
  }

  #[tokio::test]
  async fn test_process_reports_level_outcome() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let sale = persisted_sale(&db, 10, 10_000, 1).await;
    let outcome =
      Commission::new(&db).process_for_sale(&sale).await.unwrap();

    assert_eq!(outcome.commissions.len(), 1);
    match outcome.level {
      LevelOutcome::Updated(update) => {
        assert_eq!(update.broker_id, 1);
        // One week sold keeps the broker at the base tier
        assert!(!update.changed);
        assert_eq!(update.new_tag, LevelTag::Broker);
      }
      other => panic!("expected level update, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_release_due_flips_only_expired_holds() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();
    sv::Referral::new(&db).attach(11, 1).await.unwrap();

    // One commission already out of hold, one still held
    let expired = persisted_sale(&db, 10, 1_000, 1).await;
    let sv = Commission::with_hold_days(&db, 0);
    let shares = sv.calculate(&expired).await.unwrap();
    sv.record(&expired, &shares).await.unwrap();

    let held = persisted_sale(&db, 11, 1_000, 1).await;
    let sv = Commission::new(&db);
    let shares = sv.calculate(&held).await.unwrap();
    sv.record(&held, &shares).await.unwrap();

    let now = Utc::now().naive_utc();
    assert_eq!(sv.release_due(now).await.unwrap(), 1);
    // Idempotent: nothing left to release
    assert_eq!(sv.release_due(now).await.unwrap(), 0);

    let rows = sv.by_broker(1).await.unwrap();
    let released = rows
      .iter()
      .filter(|c| c.status == CommissionStatus::Available)
      .count();
    assert_eq!(released, 1);
  }

  #[tokio::test]
  async fn test_mark_paid_requires_released_commission() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let sale = persisted_sale(&db, 10, 1_000, 1).await;
    let sv = Commission::with_hold_days(&db, 0);
    let shares = sv.calculate(&sale).await.unwrap();
    let recorded = sv.record(&sale, &shares).await.unwrap();
    let id = recorded[0].id;

    // Still pending: not payable
    let result = sv.mark_paid(id).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));

    sv.release_due(Utc::now().naive_utc()).await.unwrap();

    let paid = sv.mark_paid(id).await.unwrap();
    assert_eq!(paid.status, CommissionStatus::Paid);
  }
}
