// grocer/src/checkout/mod.rs

//! Checkout: turns a cart into an order (and subscriptions for recurring lines).
//!
//! The work runs as the `checkout` pipeline built in [`pipeline`]. Any failure
//! after stock was taken unwinds through the step compensators, so a rejected
//! checkout leaves inventory where it found it.

pub mod context;
pub mod pipeline;

use crate::engine::Engine;
use crate::error::{GrocerError, GrocerResult};
use crate::model::{Caller, Frequency, Order, ShippingAddress};
use crate::pipeline::{ContextData, PipelineResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

pub use context::{CheckoutCtxData, Reservation};
pub use pipeline::build_checkout_pipeline;

/// One cart line as submitted by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product: Uuid,
  pub qty: u32,
  /// Display name the customer saw; only used in error messages.
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub is_subscription: bool,
  #[serde(default)]
  pub frequency: Option<Frequency>,
  #[serde(default)]
  pub start_date: Option<DateTime<Utc>>,
}

impl CartLine {
  pub fn new(product: Uuid, qty: u32) -> Self {
    Self {
      product,
      qty,
      name: None,
      is_subscription: false,
      frequency: None,
      start_date: None,
    }
  }

  pub fn subscribe(mut self, frequency: Frequency, start_date: Option<DateTime<Utc>>) -> Self {
    self.is_subscription = true;
    self.frequency = Some(frequency);
    self.start_date = start_date;
    self
  }

  /// The name to show for this line, falling back to the product id.
  pub fn label(&self) -> String {
    match self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
      Some(name) => name.to_string(),
      None => self.product.to_string(),
    }
  }
}

/// A checkout submission. Prices are taken as given and stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub order_items: Vec<CartLine>,
  #[serde(default)]
  pub shipping_address: Option<ShippingAddress>,
  #[serde(default)]
  pub payment_method: Option<String>,
  pub items_price: Decimal,
  pub shipping_price: Decimal,
  pub tax_price: Decimal,
  pub total_price: Decimal,
  #[serde(default)]
  pub cod_charge: Option<Decimal>,
  #[serde(default)]
  pub is_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
  pub order: Order,
  /// Every subscription created for this checkout, in cart order. The order
  /// itself only links the last one.
  pub subscription_ids: Vec<Uuid>,
}

impl Engine {
  /// Places an order for `caller`.
  #[instrument(
    name = "Engine::checkout",
    skip_all,
    fields(user_id = %caller.user_id, lines = request.order_items.len()),
    err(Display)
  )]
  pub async fn checkout(
    &self,
    caller: &Caller,
    request: CheckoutRequest,
    now: DateTime<Utc>,
  ) -> GrocerResult<CheckoutOutcome> {
    let ctx = ContextData::new(CheckoutCtxData::new(self.stores().clone(), caller.user_id, request, now));

    match self.checkout_pipeline().run(ctx.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => {
        return Err(GrocerError::Internal("checkout stopped before an order was placed".to_string()));
      }
    }

    let outcome = ctx.update(|data| {
      let order = data
        .order
        .take()
        .ok_or_else(|| GrocerError::Internal("checkout completed without an order".to_string()))?;
      let subscription_ids = data.subscriptions.iter().map(|s| s.id).collect::<Vec<_>>();
      Ok::<_, GrocerError>(CheckoutOutcome { order, subscription_ids })
    })?;

    info!(
      order_id = %outcome.order.id,
      subscriptions = outcome.subscription_ids.len(),
      "Order placed."
    );
    Ok(outcome)
  }
}
