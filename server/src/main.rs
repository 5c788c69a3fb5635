// grocer_server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use grocer::Engine;
use grocer_server::config::AppConfig;
use grocer_server::state::AppState;
use grocer_server::web::configure_app_routes;
use grocer_server::{db, seed, ticker};
use std::io;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting grocer server...");

  let app_config = AppConfig::from_env().map_err(|e| startup_error("Failed to load application configuration", e))?;

  let stores = db::build_stores(&app_config)
    .await
    .map_err(|e| startup_error("Failed to initialise the store backend", e))?;

  if app_config.seed_db {
    seed::seed(&stores)
      .await
      .map_err(|e| startup_error("Failed to seed the database", e))?;
  }

  let engine = Engine::new(stores).with_policy(app_config.transition_policy);

  if let Some(period) = app_config.subscription_tick {
    ticker::spawn_generation_ticker(engine.clone(), period);
  }

  let server_address = app_config.bind_address();
  let app_state = AppState::new(engine, app_config);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
