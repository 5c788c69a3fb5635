// grocer/src/analytics.rs

use crate::engine::Engine;
use crate::error::GrocerResult;
use rust_decimal::Decimal;
use serde::Serialize;

/// Store-wide totals for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
  pub total_orders: u64,
  pub total_products: u64,
  pub total_users: u64,
  /// Sum of `totalPrice` over paid orders.
  pub total_sales: Decimal,
}

impl Engine {
  pub async fn analytics(&self) -> GrocerResult<Analytics> {
    let stores = self.stores();
    Ok(Analytics {
      total_orders: stores.orders.count().await?,
      total_products: stores.products.count().await?,
      total_users: stores.users.count().await?,
      total_sales: stores.orders.paid_total().await?,
    })
  }
}
