// grocer_server/src/db/mod.rs

//! PostgreSQL implementations of the engine's store traits.
//!
//! Queries are built at runtime (`sqlx::query`/`query_as`), so the crate
//! compiles without a live database. Order line items, shipping addresses and
//! tracking history live in JSONB columns.

mod order_repo;
mod product_repo;
mod rows;
mod subscription_repo;
mod user_repo;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::{AppError, Result};
use grocer::{GrocerError, Stores};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

/// Every store over one connection pool.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  pub fn into_stores(self) -> Stores {
    let store = Arc::new(self);
    Stores {
      products: store.clone(),
      orders: store.clone(),
      subscriptions: store.clone(),
      users: store,
    }
  }
}

pub(crate) fn storage(err: sqlx::Error) -> GrocerError {
  GrocerError::storage(err)
}

/// Stored integers that no longer fit the domain type are a storage fault.
pub(crate) fn corrupt(what: &str, detail: impl std::fmt::Display) -> GrocerError {
  GrocerError::storage(anyhow::anyhow!("corrupt {} column: {}", what, detail))
}

pub async fn connect(config: &AppConfig) -> Result<PgPool> {
  let url = config
    .database_url
    .as_deref()
    .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
  let pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(url)
    .await?;
  info!("Successfully connected to the database.");

  if config.run_migrations {
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied.");
  }
  Ok(pool)
}

/// Builds the stores selected by `STORE_BACKEND`.
pub async fn build_stores(config: &AppConfig) -> Result<Stores> {
  match config.store_backend {
    StoreBackend::Memory => {
      info!("Using in-memory stores; data is lost on restart.");
      Ok(Stores::in_memory())
    }
    StoreBackend::Postgres => Ok(PgStore::new(connect(config).await?).into_stores()),
  }
}

#[cfg(test)]
mod tests {
  const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

  #[test]
  fn money_columns_keep_full_precision() {
    for column in ["price", "items_price", "shipping_price", "tax_price", "total_price", "cod_charge"] {
      let line = SCHEMA
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with(&format!("{} ", column)))
        .unwrap_or_else(|| panic!("column {} missing from schema", column));
      assert!(line.contains("NUMERIC"), "{}", line);
      assert!(!line.contains("NUMERIC("), "{} must not round: {}", column, line);
    }
  }
}
