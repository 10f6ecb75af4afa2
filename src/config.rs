use std::env;

use anyhow::{Context, bail};

/// Runtime configuration, read once at startup. Missing required
/// variables abort the boot with a precise message instead of failing
/// later mid-request.
#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  /// Shared secret for the admin API key and webhook signatures.
  pub api_secret: String,
  pub port: u16,
  /// Days a commission stays pending before release.
  pub hold_days: i64,
  pub release_interval_secs: u64,
  pub level_sweep_interval_secs: u64,
  pub event_gc_interval_secs: u64,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let database_url = env::var("DATABASE_URL")
      .unwrap_or_else(|_| "sqlite:weekchain.db?mode=rwc".into());

    let api_secret = env::var("API_SECRET").context("API_SECRET not set")?;
    if api_secret.len() < 16 {
      bail!("API_SECRET must be at least 16 characters");
    }

    Ok(Self {
      database_url,
      api_secret,
      port: parse_or("PORT", 3000),
      hold_days: parse_or("COMMISSION_HOLD_DAYS", 45),
      release_interval_secs: parse_or("HOLD_RELEASE_INTERVAL_SECS", 3600),
      level_sweep_interval_secs: parse_or(
        "LEVEL_SWEEP_INTERVAL_SECS",
        24 * 3600,
      ),
      event_gc_interval_secs: parse_or("EVENT_GC_INTERVAL_SECS", 600),
    })
  }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
  env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
