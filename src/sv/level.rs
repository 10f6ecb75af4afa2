use serde::Serialize;

use crate::{
  entity::{
    BenefitStatus, BenefitType, LevelTag, broker, broker_level, elite_benefit,
    referral,
  },
  prelude::*,
  utils::format_usdc,
};

/// Minimum tenure before a retirement bonus can be granted.
pub const RETIREMENT_MIN_YEARS: i32 = 5;

pub struct Level<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrokerStats {
  pub total_weeks_sold: i32,
  pub years_active: i32,
  pub num_affiliates: i32,
  pub total_commissions_micro: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelUpdate {
  pub broker_id: i64,
  pub old_tag: Option<LevelTag>,
  pub new_tag: LevelTag,
  pub changed: bool,
  pub direct_rate_bps: i32,
  pub stats: BrokerStats,
}

#[derive(Debug, Serialize)]
pub struct LevelProgress {
  pub weeks_needed: i32,
  pub affiliates_needed: i32,
  pub weeks_progress: f64,
  pub affiliates_progress: f64,
}

#[derive(Debug, Serialize)]
pub struct LevelInfo {
  pub profile: broker::Model,
  pub current: Option<broker_level::Model>,
  pub stats: BrokerStats,
  /// Absent when the broker already holds the top tier.
  pub next: Option<broker_level::Model>,
  pub progress: Option<LevelProgress>,
}

#[derive(Debug, Serialize)]
pub struct RetirementEligibility {
  pub eligible: bool,
  pub rate_bps: i32,
  pub reason: String,
}

/// Pick the highest-rank level whose thresholds the stats satisfy.
/// Pure so that re-running with unchanged stats is a no-op by
/// construction rather than by the store's behavior.
pub fn resolve_level<'l>(
  stats: &BrokerStats,
  levels: &'l [broker_level::Model],
) -> Option<&'l broker_level::Model> {
  levels
    .iter()
    .filter(|level| {
      stats.total_weeks_sold >= level.min_weeks_sold
        && stats.num_affiliates >= level.min_affiliates
    })
    .max_by_key(|level| level.rank)
    .or_else(|| levels.iter().min_by_key(|level| level.rank))
}

/// Percentage toward a threshold, clamped to [0, 100].
fn progress_pct(achieved: i32, required: i32) -> f64 {
  if required <= 0 {
    return 100.0;
  }
  (achieved as f64 / required as f64 * 100.0).clamp(0.0, 100.0)
}

impl<'a> Level<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn levels(&self) -> Result<Vec<broker_level::Model>> {
    Ok(
      broker_level::Entity::find()
        .order_by_asc(broker_level::Column::Rank)
        .all(self.db)
        .await?,
    )
  }

  #[allow(dead_code)]
  pub async fn by_tag(
    &self,
    tag: LevelTag,
  ) -> Result<Option<broker_level::Model>> {
    Ok(
      broker_level::Entity::find()
        .filter(broker_level::Column::Tag.eq(tag))
        .one(self.db)
        .await?,
    )
  }

  pub async fn stats(&self, broker_id: i64) -> Result<BrokerStats> {
    let broker = broker::Entity::find_by_id(broker_id)
      .one(self.db)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    self.stats_for(&broker).await
  }

  pub async fn stats_for(&self, broker: &broker::Model) -> Result<BrokerStats> {
    let num_affiliates = referral::Entity::find()
      .filter(referral::Column::BrokerId.eq(broker.user_id))
      .filter(referral::Column::Level.eq(1))
      .count(self.db)
      .await? as i32;

    let years_active =
      ((Utc::now().naive_utc() - broker.reg_date).num_days() / 365) as i32;

    Ok(BrokerStats {
      total_weeks_sold: broker.total_weeks_sold,
      years_active,
      num_affiliates,
      total_commissions_micro: broker.total_commissions_micro,
    })
  }

  /// Recompute a broker's tier from live stats. Idempotent: unchanged
  /// stats resolve to the same tier and skip the write entirely.
  pub async fn update_level(&self, broker_id: i64) -> Result<LevelUpdate> {
    let broker = broker::Entity::find_by_id(broker_id)
      .one(self.db)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    let levels = self.levels().await?;
    let stats = self.stats_for(&broker).await?;
    let resolved = resolve_level(&stats, &levels).ok_or(Error::LevelNotFound)?;

    let old_tag =
      levels.iter().find(|l| l.id == broker.level_id).map(|l| l.tag.clone());
    let changed = broker.level_id != resolved.id;

    let update = LevelUpdate {
      broker_id,
      old_tag,
      new_tag: resolved.tag.clone(),
      changed,
      direct_rate_bps: resolved.direct_rate_bps,
      stats,
    };

    if changed {
      let level_id = resolved.id;
      broker::ActiveModel { level_id: Set(level_id), ..broker.into() }
        .update(self.db)
        .await?;

      info!(
        "broker {} level changed: {:?} -> {:?}",
        broker_id, update.old_tag, update.new_tag
      );
    }

    Ok(update)
  }

  pub async fn level_info(&self, broker_id: i64) -> Result<LevelInfo> {
    let broker = broker::Entity::find_by_id(broker_id)
      .one(self.db)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    let stats = self.stats_for(&broker).await?;

    let current =
      broker_level::Entity::find_by_id(broker.level_id).one(self.db).await?;
    let current_rank = current.as_ref().map_or(1, |level| level.rank);

    let next = broker_level::Entity::find()
      .filter(broker_level::Column::Rank.gt(current_rank))
      .order_by_asc(broker_level::Column::Rank)
      .one(self.db)
      .await?;

    let progress = next.as_ref().map(|next| LevelProgress {
      weeks_needed: (next.min_weeks_sold - stats.total_weeks_sold).max(0),
      affiliates_needed: (next.min_affiliates - stats.num_affiliates).max(0),
      weeks_progress: progress_pct(stats.total_weeks_sold, next.min_weeks_sold),
      affiliates_progress: progress_pct(
        stats.num_affiliates,
        next.min_affiliates,
      ),
    });

    Ok(LevelInfo { profile: broker, current, stats, next, progress })
  }

  pub async fn retirement_eligibility(
    &self,
    broker_id: i64,
  ) -> Result<RetirementEligibility> {
    let broker = broker::Entity::find_by_id(broker_id)
      .one(self.db)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    let stats = self.stats_for(&broker).await?;
    let current =
      broker_level::Entity::find_by_id(broker.level_id).one(self.db).await?;

    let Some(rate_bps) = current.as_ref().and_then(|l| l.retirement_bonus_bps)
    else {
      return Ok(RetirementEligibility {
        eligible: false,
        rate_bps: 0,
        reason: "Current level carries no retirement bonus".into(),
      });
    };

    if stats.years_active < RETIREMENT_MIN_YEARS {
      return Ok(RetirementEligibility {
        eligible: false,
        rate_bps: 0,
        reason: format!(
          "Requires {RETIREMENT_MIN_YEARS} years active, has {}",
          stats.years_active
        ),
      });
    }

    Ok(RetirementEligibility {
      eligible: true,
      rate_bps,
      reason: "Eligible".into(),
    })
  }

  /// Called when a whole property is sold. An ineligible broker is a
  /// normal empty outcome, not an error.
  pub async fn record_retirement_bonus(
    &self,
    broker_id: i64,
    property_id: &str,
    sale_price_micro: i64,
  ) -> Result<Option<elite_benefit::Model>> {
    let eligibility = self.retirement_eligibility(broker_id).await?;

    if !eligibility.eligible {
      info!(
        "broker {broker_id} not eligible for retirement bonus: {}",
        eligibility.reason
      );
      return Ok(None);
    }

    let amount_micro = sale_price_micro * eligibility.rate_bps as i64 / 10_000;
    let now = Utc::now().naive_utc();

    let benefit = elite_benefit::ActiveModel {
      id: NotSet,
      broker_id: Set(broker_id),
      property_id: Set(property_id.to_string()),
      benefit_type: Set(BenefitType::RetirementBonus),
      ownership_bps: Set(Some(eligibility.rate_bps)),
      weeks_bonus: Set(None),
      amount_micro: Set(Some(amount_micro)),
      status: Set(BenefitStatus::Pending),
      created_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!(
      "retirement bonus recorded for broker {broker_id}: {} USDC",
      format_usdc(amount_micro)
    );

    Ok(Some(benefit))
  }

  pub async fn grant_time_bonus(
    &self,
    broker_id: i64,
    property_id: &str,
    weeks_bonus: i32,
  ) -> Result<elite_benefit::Model> {
    if weeks_bonus <= 0 {
      return Err(Error::InvalidArgs("Weeks bonus must be positive".into()));
    }

    let txn = self.db.begin().await?;

    let broker = broker::Entity::find_by_id(broker_id)
      .one(&txn)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    let now = Utc::now().naive_utc();
    let benefit = elite_benefit::ActiveModel {
      id: NotSet,
      broker_id: Set(broker_id),
      property_id: Set(property_id.to_string()),
      benefit_type: Set(BenefitType::TimeBonus),
      ownership_bps: Set(None),
      weeks_bonus: Set(Some(weeks_bonus)),
      amount_micro: Set(None),
      status: Set(BenefitStatus::Granted),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    broker::ActiveModel {
      bonuses_claimed: Set(broker.bonuses_claimed + 1),
      ..broker.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    Ok(benefit)
  }

  /// Recompute every broker. Used by the nightly sweep as a safety net
  /// for updates swallowed during commission processing.
  pub async fn sweep(&self) -> Result<u64> {
    let brokers = broker::Entity::find().all(self.db).await?;
    let mut changes = 0;

    for broker in brokers {
      match self.update_level(broker.user_id).await {
        Ok(update) if update.changed => changes += 1,
        Ok(_) => {}
        Err(err) => {
          error!("level sweep failed for broker {}: {err}", broker.user_id);
        }
      }
    }

    Ok(changes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{self, test_utils::test_db};

  async fn broker_with_stats(
    db: &DatabaseConnection,
    user_id: i64,
    weeks: i32,
    affiliates: i64,
  ) -> broker::Model {
    let broker = sv::Broker::new(db).get_or_create(user_id).await.unwrap();

    for n in 0..affiliates {
      // Affiliate ids far away from broker ids used in tests
      sv::Referral::new(db).attach(10_000 + user_id * 100 + n, user_id).await.unwrap();
    }

    broker::ActiveModel { total_weeks_sold: Set(weeks), ..broker.into() }
      .update(db)
      .await
      .unwrap()
  }

  fn stats(weeks: i32, affiliates: i32) -> BrokerStats {
    BrokerStats {
      total_weeks_sold: weeks,
      years_active: 0,
      num_affiliates: affiliates,
      total_commissions_micro: 0,
    }
  }

  #[tokio::test]
  async fn test_resolve_level_picks_highest_satisfied() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let levels = Level::new(&db).levels().await.unwrap();

    let base = resolve_level(&stats(0, 0), &levels).unwrap();
    assert_eq!(base.tag, LevelTag::Broker);

    let silver = resolve_level(&stats(30, 6), &levels).unwrap();
    assert_eq!(silver.tag, LevelTag::SilverBroker);

    let elite = resolve_level(&stats(150, 25), &levels).unwrap();
    assert_eq!(elite.tag, LevelTag::BrokerElite);

    // Weeks alone are not enough for silver
    let still_base = resolve_level(&stats(30, 0), &levels).unwrap();
    assert_eq!(still_base.tag, LevelTag::Broker);
  }

  #[tokio::test]
  async fn test_update_level_is_idempotent() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    broker_with_stats(&db, 1, 30, 5).await;

    let sv = Level::new(&db);
    let first = sv.update_level(1).await.unwrap();
    assert!(first.changed);
    assert_eq!(first.old_tag, Some(LevelTag::Broker));
    assert_eq!(first.new_tag, LevelTag::SilverBroker);

    let second = sv.update_level(1).await.unwrap();
    assert!(!second.changed);
    assert_eq!(second.new_tag, LevelTag::SilverBroker);
  }

  #[tokio::test]
  async fn test_level_never_regresses_without_stat_change() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    broker_with_stats(&db, 1, 100, 20).await;

    let sv = Level::new(&db);
    let first = sv.update_level(1).await.unwrap();
    let second = sv.update_level(1).await.unwrap();

    assert_eq!(first.new_tag, LevelTag::BrokerElite);
    assert_eq!(second.new_tag, LevelTag::BrokerElite);
  }

  #[tokio::test]
  async fn test_level_info_top_tier_has_no_next() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    broker_with_stats(&db, 1, 150, 25).await;
    Level::new(&db).update_level(1).await.unwrap();

    let info = Level::new(&db).level_info(1).await.unwrap();
    assert_eq!(info.current.unwrap().tag, LevelTag::BrokerElite);
    assert!(info.next.is_none());
    assert!(info.progress.is_none());
  }

  #[tokio::test]
  async fn test_progress_is_clamped() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    // Over the silver weeks threshold but with no affiliates, so the
    // broker still sits at the base tier
    broker_with_stats(&db, 1, 40, 0).await;

    let info = Level::new(&db).level_info(1).await.unwrap();
    let progress = info.progress.unwrap();

    assert_eq!(progress.weeks_progress, 100.0);
    assert_eq!(progress.weeks_needed, 0);
    assert_eq!(progress.affiliates_progress, 0.0);
    assert_eq!(progress.affiliates_needed, 5);
  }

  #[tokio::test]
  async fn test_progress_toward_next_tier() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    broker_with_stats(&db, 1, 5, 1).await;

    let info = Level::new(&db).level_info(1).await.unwrap();
    assert_eq!(info.next.as_ref().unwrap().tag, LevelTag::SilverBroker);

    let progress = info.progress.unwrap();
    assert_eq!(progress.weeks_needed, 20);
    assert_eq!(progress.affiliates_needed, 4);
    assert_eq!(progress.weeks_progress, 20.0);
    assert_eq!(progress.affiliates_progress, 20.0);
  }

  #[tokio::test]
  async fn test_retirement_requires_elite_tier() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    broker_with_stats(&db, 1, 0, 0).await;

    let eligibility =
      Level::new(&db).retirement_eligibility(1).await.unwrap();
    assert!(!eligibility.eligible);

    let bonus = Level::new(&db)
      .record_retirement_bonus(1, "prop-1", 100_000 * 1_000_000)
      .await
      .unwrap();
    assert!(bonus.is_none());
  }

  #[tokio::test]
  async fn test_retirement_requires_tenure() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let broker = broker_with_stats(&db, 1, 150, 25).await;
    Level::new(&db).update_level(1).await.unwrap();

    // Fresh elite broker: tier satisfied, tenure not
    let eligibility =
      Level::new(&db).retirement_eligibility(1).await.unwrap();
    assert!(!eligibility.eligible);

    // Backdate registration past the tenure requirement
    let old = Utc::now().naive_utc() - TimeDelta::days(6 * 365);
    broker::ActiveModel { reg_date: Set(old), ..broker.into() }
      .update(&db)
      .await
      .unwrap();

    let eligibility =
      Level::new(&db).retirement_eligibility(1).await.unwrap();
    assert!(eligibility.eligible);
    assert_eq!(eligibility.rate_bps, 100);
  }

  #[tokio::test]
  async fn test_retirement_bonus_amount() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let broker = broker_with_stats(&db, 1, 150, 25).await;
    Level::new(&db).update_level(1).await.unwrap();

    let old = Utc::now().naive_utc() - TimeDelta::days(6 * 365);
    broker::ActiveModel { reg_date: Set(old), ..broker.into() }
      .update(&db)
      .await
      .unwrap();

    // 1% of 500,000 USDC
    let bonus = Level::new(&db)
      .record_retirement_bonus(1, "prop-1", 500_000 * 1_000_000)
      .await
      .unwrap()
      .unwrap();

    assert_eq!(bonus.amount_micro, Some(5_000 * 1_000_000));
    assert_eq!(bonus.benefit_type, BenefitType::RetirementBonus);
    assert_eq!(bonus.status, BenefitStatus::Pending);
  }

  #[tokio::test]
  async fn test_grant_time_bonus() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();

    let benefit =
      Level::new(&db).grant_time_bonus(1, "prop-1", 1).await.unwrap();
    assert_eq!(benefit.weeks_bonus, Some(1));
    assert_eq!(benefit.status, BenefitStatus::Granted);

    let broker = sv::Broker::new(&db).by_id(1).await.unwrap().unwrap();
    assert_eq!(broker.bonuses_claimed, 1);
  }

  #[tokio::test]
  async fn test_grant_time_bonus_rejects_non_positive() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();

    let result = Level::new(&db).grant_time_bonus(1, "prop-1", 0).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }
}
