use crate::{
  entity::{broker, broker::BrokerRole, broker_level},
  prelude::*,
};

pub struct Broker<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Broker<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Fetch a profile, creating it at the base tier on first contact.
  pub async fn get_or_create(&self, user_id: i64) -> Result<broker::Model> {
    if let Some(broker) =
      broker::Entity::find_by_id(user_id).one(self.db).await?
    {
      return Ok(broker);
    }

    let base = broker_level::Entity::find()
      .order_by_asc(broker_level::Column::Rank)
      .one(self.db)
      .await?;

    let now = Utc::now().naive_utc();
    let broker = broker::ActiveModel {
      user_id: Set(user_id),
      display_name: Set(None),
      role: Set(BrokerRole::User),
      level_id: Set(base.map_or(1, |level| level.id)),
      total_weeks_sold: Set(0),
      total_commissions_micro: Set(0),
      bonuses_claimed: Set(0),
      reg_date: Set(now),
    };

    Ok(broker.insert(self.db).await?)
  }

  pub async fn by_id(&self, user_id: i64) -> Result<Option<broker::Model>> {
    let broker = broker::Entity::find_by_id(user_id).one(self.db).await?;
    Ok(broker)
  }

  pub async fn set_role(&self, user_id: i64, role: BrokerRole) -> Result<()> {
    let broker = broker::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::BrokerNotFound)?;

    broker::ActiveModel { role: Set(role), ..broker.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  #[allow(dead_code)]
  pub async fn count(&self) -> Result<u64> {
    Ok(broker::Entity::find().count(self.db).await?)
  }
}
