// grocer_server/src/bin/reset_orders.rs

//! Deletes every order. Subscriptions, products and users are left alone.

use grocer::Engine;
use grocer_server::config::AppConfig;
use grocer_server::db;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let config = match AppConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return ExitCode::FAILURE;
    }
  };

  let stores = match db::build_stores(&config).await {
    Ok(stores) => stores,
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the store backend.");
      return ExitCode::FAILURE;
    }
  };

  match Engine::new(stores).reset_orders().await {
    Ok(removed) => {
      tracing::info!(removed, "All orders removed.");
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to reset orders.");
      ExitCode::FAILURE
    }
  }
}
