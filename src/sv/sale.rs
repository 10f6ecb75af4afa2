use uuid::Uuid;

use crate::{
  entity::{SaleStatus, sale},
  prelude::*,
  sv::commission::{self, Commission, SaleCommissions, SaleInput},
};

pub struct Sale<'a> {
  db: &'a DatabaseConnection,
  hold_days: i64,
}

impl<'a> Sale<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db, hold_days: commission::DEFAULT_HOLD_DAYS }
  }

  pub fn with_hold_days(db: &'a DatabaseConnection, hold_days: i64) -> Self {
    Self { db, hold_days }
  }

  pub async fn create(
    &self,
    buyer_user_id: i64,
    amount_micro: i64,
    weeks: i32,
  ) -> Result<sale::Model> {
    if amount_micro <= 0 {
      return Err(Error::InvalidArgs("Sale amount must be positive".into()));
    }
    if weeks <= 0 {
      return Err(Error::InvalidArgs(
        "Sale must cover at least one week".into(),
      ));
    }

    let now = Utc::now().naive_utc();
    let sale = sale::ActiveModel {
      id: Set(Uuid::new_v4().to_string()),
      buyer_user_id: Set(buyer_user_id),
      amount_micro: Set(amount_micro),
      weeks: Set(weeks),
      status: Set(SaleStatus::Requested),
      created_at: Set(now),
      confirmed_at: Set(None),
    };

    Ok(sale.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<sale::Model>> {
    let sale = sale::Entity::find_by_id(id).one(self.db).await?;
    Ok(sale)
  }

  pub async fn offer(&self, id: &str) -> Result<sale::Model> {
    let sale = sale::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::SaleNotFound)?;

    match sale.status {
      SaleStatus::Requested => {}
      SaleStatus::Cancelled => return Err(Error::SaleCancelled),
      _ => {
        return Err(Error::InvalidArgs(
          "Only requested sales can be offered".into(),
        ));
      }
    }

    Ok(
      sale::ActiveModel { status: Set(SaleStatus::Offered), ..sale.into() }
        .update(self.db)
        .await?,
    )
  }

  /// Confirm a sale and attribute commissions. A second confirm is
  /// rejected, so a sale can never produce two commission records.
  pub async fn confirm(
    &self,
    id: &str,
  ) -> Result<(sale::Model, SaleCommissions)> {
    let sale = sale::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::SaleNotFound)?;

    match sale.status {
      SaleStatus::Confirmed => return Err(Error::SaleAlreadyConfirmed),
      SaleStatus::Cancelled => return Err(Error::SaleCancelled),
      SaleStatus::Requested | SaleStatus::Offered => {}
    }

    let now = Utc::now().naive_utc();
    let confirmed = sale::ActiveModel {
      status: Set(SaleStatus::Confirmed),
      confirmed_at: Set(Some(now)),
      ..sale.into()
    }
    .update(self.db)
    .await?;

    let input = SaleInput::from(&confirmed);
    let outcome = Commission::with_hold_days(self.db, self.hold_days)
      .process_for_sale(&input)
      .await?;

    Ok((confirmed, outcome))
  }

  pub async fn cancel(&self, id: &str) -> Result<sale::Model> {
    let sale = sale::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::SaleNotFound)?;

    if sale.status == SaleStatus::Confirmed {
      return Err(Error::InvalidArgs(
        "Confirmed sales cannot be cancelled".into(),
      ));
    }

    Ok(
      sale::ActiveModel { status: Set(SaleStatus::Cancelled), ..sale.into() }
        .update(self.db)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{CommissionStatus, commission},
    sv::{self, commission::MICRO_USDC, test_utils::test_db},
  };

  #[tokio::test]
  async fn test_referred_sale_end_to_end() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    // Broker B refers buyer U, U buys a 5,000 USDC week
    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let sv = Sale::new(&db);
    let sale = sv.create(10, 5_000 * MICRO_USDC, 1).await.unwrap();
    let offered = sv.offer(&sale.id).await.unwrap();
    assert_eq!(offered.status, SaleStatus::Offered);

    let (confirmed, outcome) = sv.confirm(&sale.id).await.unwrap();
    assert_eq!(confirmed.status, SaleStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());

    assert_eq!(outcome.commissions.len(), 1);
    let commission = &outcome.commissions[0];
    assert_eq!(commission.broker_id, 1);
    assert_eq!(commission.amount_micro, 200 * MICRO_USDC);
    assert_eq!(commission.status, CommissionStatus::Pending);
    assert_eq!(commission.referral_level, 1);

    let stats = sv::Level::new(&db).stats(1).await.unwrap();
    assert_eq!(stats.total_weeks_sold, 1);
    assert_eq!(stats.total_commissions_micro, 200 * MICRO_USDC);
  }

  #[tokio::test]
  async fn test_unreferred_sale_confirms_without_commission() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let sv = Sale::new(&db);
    let sale = sv.create(10, 5_000 * MICRO_USDC, 1).await.unwrap();
    let (confirmed, outcome) = sv.confirm(&sale.id).await.unwrap();

    assert_eq!(confirmed.status, SaleStatus::Confirmed);
    assert!(outcome.commissions.is_empty());

    let count = commission::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
  }

  #[tokio::test]
  async fn test_double_confirm_rejected() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    sv::Broker::new(&db).get_or_create(1).await.unwrap();
    sv::Referral::new(&db).attach(10, 1).await.unwrap();

    let sv = Sale::new(&db);
    let sale = sv.create(10, 5_000 * MICRO_USDC, 1).await.unwrap();
    sv.confirm(&sale.id).await.unwrap();

    let result = sv.confirm(&sale.id).await;
    assert!(matches!(result, Err(Error::SaleAlreadyConfirmed)));

    // Still exactly one commission row
    let count = commission::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);
  }

  #[tokio::test]
  async fn test_cancelled_sale_cannot_confirm() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let sv = Sale::new(&db);
    let sale = sv.create(10, 5_000 * MICRO_USDC, 1).await.unwrap();
    sv.cancel(&sale.id).await.unwrap();

    let result = sv.confirm(&sale.id).await;
    assert!(matches!(result, Err(Error::SaleCancelled)));
  }

  #[tokio::test]
  async fn test_confirmed_sale_cannot_cancel() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let sv = Sale::new(&db);
    let sale = sv.create(10, 5_000 * MICRO_USDC, 1).await.unwrap();
    sv.confirm(&sale.id).await.unwrap();

    let result = sv.cancel(&sale.id).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_offer_requires_requested_state() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let sv = Sale::new(&db);
    let sale = sv.create(10, 5_000 * MICRO_USDC, 1).await.unwrap();
    sv.offer(&sale.id).await.unwrap();

    let result = sv.offer(&sale.id).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_create_validates_input() {
    let db = test_db::setup().await;
    test_db::seed_levels(&db).await;

    let sv = Sale::new(&db);
    assert!(matches!(
      sv.create(10, 0, 1).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.create(10, MICRO_USDC, 0).await,
      Err(Error::InvalidArgs(_))
    ));
  }
}
