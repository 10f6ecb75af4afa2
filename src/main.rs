mod config;
mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Config, prelude::*, state::AppState};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "weekchain=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env().expect("Invalid configuration");

  info!(
    "Starting WEEK-CHAIN broker engine v{}",
    env!("CARGO_PKG_VERSION")
  );

  let app_state =
    Arc::new(AppState::new(config).await.expect("Failed to init app state"));

  plugins::App::new()
    .register(plugins::server::Plugin)
    .register(plugins::cron::HoldRelease)
    .register(plugins::cron::LevelSweep)
    .register(plugins::cron::EventGc)
    .run(app_state)
    .await;

  tokio::signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
  info!("Shutting down");
}
