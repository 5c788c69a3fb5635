// grocer_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use grocer::TransitionPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// Everything in process memory; lost on restart.
  Memory,
}

impl FromStr for StoreBackend {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(format!("unknown store backend '{}'", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub store_backend: StoreBackend,
  /// Required for the postgres backend.
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  pub transition_policy: TransitionPolicy,
  pub generate_requires_admin: bool,
  /// Period of the in-process generation ticker; `None` disables it.
  pub subscription_tick: Option<Duration>,

  pub seed_db: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Postgres,
      database_url: None,
      database_max_connections: 10,
      run_migrations: true,
      transition_policy: TransitionPolicy::Permissive,
      generate_requires_admin: true,
      subscription_tick: None,
      seed_db: false,
    }
  }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
  }

  /// Builds the configuration from any variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = Self::default();

    let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = parse_var("SERVER_PORT", lookup("SERVER_PORT"), defaults.server_port)?;
    let store_backend = parse_var("STORE_BACKEND", lookup("STORE_BACKEND"), defaults.store_backend)?;
    let database_url = lookup("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required by the postgres backend)".to_string(),
      ));
    }
    let database_max_connections = parse_var(
      "DATABASE_MAX_CONNECTIONS",
      lookup("DATABASE_MAX_CONNECTIONS"),
      defaults.database_max_connections,
    )?;
    let run_migrations = parse_var("RUN_MIGRATIONS", lookup("RUN_MIGRATIONS"), defaults.run_migrations)?;
    let transition_policy = parse_var(
      "ORDER_TRANSITION_POLICY",
      lookup("ORDER_TRANSITION_POLICY"),
      defaults.transition_policy,
    )?;
    let generate_requires_admin = parse_var(
      "GENERATE_REQUIRES_ADMIN",
      lookup("GENERATE_REQUIRES_ADMIN"),
      defaults.generate_requires_admin,
    )?;
    let subscription_tick = match parse_var("SUBSCRIPTION_TICK_SECS", lookup("SUBSCRIPTION_TICK_SECS"), 0u64)? {
      0 => None,
      secs => Some(Duration::from_secs(secs)),
    };
    let seed_db = parse_var("SEED_DB", lookup("SEED_DB"), defaults.seed_db)?;

    tracing::info!(
      backend = ?store_backend,
      policy = %transition_policy,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      run_migrations,
      transition_policy,
      generate_requires_admin,
      subscription_tick,
      seed_db,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
