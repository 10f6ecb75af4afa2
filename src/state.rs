use migration::{Migrator, MigratorTrait};

use crate::{config::Config, prelude::*};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  /// Webhook event ids already processed, with first-seen time.
  /// Deduplicates gateway redeliveries; pruned by the EventGc plugin.
  webhook_events: DashMap<String, DateTime>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(config.database_url.as_str()).await?;
    Migrator::up(&db, None).await?;

    Ok(Self { db, config, webhook_events: DashMap::new() })
  }

  /// Remember a webhook event id. Returns false for a replay.
  pub fn mark_webhook_event(&self, event_id: &str) -> bool {
    let now = Utc::now().naive_utc();
    if self.webhook_events.contains_key(event_id) {
      return false;
    }
    self.webhook_events.insert(event_id.to_string(), now);
    true
  }

  /// Drop an event id so the gateway can retry a failed delivery.
  pub fn forget_webhook_event(&self, event_id: &str) {
    self.webhook_events.remove(event_id);
  }

  pub fn gc_webhook_events(&self) {
    let cutoff = Utc::now().naive_utc() - TimeDelta::days(1);
    self.webhook_events.retain(|_, seen| *seen > cutoff);
  }
}
