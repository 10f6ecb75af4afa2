use std::sync::Arc;

use async_trait::async_trait;

use crate::{plugins::Plugin, prelude::*, state::AppState, sv};

/// Flips pending commissions to available once their hold period ends.
pub struct HoldRelease;

#[async_trait]
impl Plugin for HoldRelease {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let interval_secs = app.config.release_interval_secs;
    if interval_secs == 0 {
      info!("HoldRelease disabled via config (0 interval)");
      return Ok(());
    }

    let mut interval =
      tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
      interval.tick().await;

      let now = Utc::now().naive_utc();
      match sv::Commission::new(&app.db).release_due(now).await {
        Ok(0) => {}
        Ok(released) => info!("released {released} commission(s) from hold"),
        Err(err) => error!("hold release failed: {err}"),
      }
    }
  }
}

/// Recomputes every broker level on a slow cadence. Tier updates
/// swallowed during commission processing are repaired here.
pub struct LevelSweep;

#[async_trait]
impl Plugin for LevelSweep {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let interval_secs = app.config.level_sweep_interval_secs;
    if interval_secs == 0 {
      info!("LevelSweep disabled via config (0 interval)");
      return Ok(());
    }

    let mut interval =
      tokio::time::interval(Duration::from_secs(interval_secs));

    // skip the tick at startup
    interval.tick().await;

    loop {
      interval.tick().await;

      match sv::Level::new(&app.db).sweep().await {
        Ok(changes) => info!("level sweep done, {changes} change(s)"),
        Err(err) => error!("level sweep failed: {err}"),
      }
    }
  }
}

/// Prunes processed webhook event ids so the dedup cache stays small.
pub struct EventGc;

#[async_trait]
impl Plugin for EventGc {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(
      app.config.event_gc_interval_secs.max(1),
    ));

    loop {
      interval.tick().await;
      app.gc_webhook_events();
    }
  }
}
