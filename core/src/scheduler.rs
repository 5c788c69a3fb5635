// grocer/src/scheduler.rs

//! The subscription generation cycle.

use crate::engine::Engine;
use crate::error::{GrocerError, GrocerResult};
use crate::model::order::SUBSCRIPTION_PAYMENT;
use crate::model::{Order, OrderItem, OrderStatus, ShippingAddress, Subscription, TrackingEntry};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const GENERATED_COMMENT: &str = "Subscription order generated automatically.";
pub const FALLBACK_ADDRESS: &str = "Default Address";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
  ProductMissing,
  InsufficientStock,
  /// Cancelled, paused or already generated by a concurrent cycle.
  NoLongerDue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSubscription {
  pub subscription_id: Uuid,
  pub reason: SkipReason,
}

/// Result of one generation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
  pub generated: Vec<Order>,
  pub skipped: Vec<SkippedSubscription>,
}

impl GenerationReport {
  pub fn message(&self) -> String {
    if self.generated.is_empty() && self.skipped.is_empty() {
      "No orders to generate due today.".to_string()
    } else {
      format!("Generated {} orders", self.generated.len())
    }
  }
}

enum Outcome {
  Generated(Order),
  Skipped(SkipReason),
}

impl Engine {
  /// Creates one order for every active subscription due at `now`.
  ///
  /// A subscription whose product is missing or short on stock is skipped and
  /// keeps its `next_delivery_date`, so the next cycle retries it. Storage
  /// failures abort the cycle; orders generated before the failure stay.
  #[instrument(name = "Engine::generate_due_orders", skip(self), err(Display))]
  pub async fn generate_due_orders(&self, now: DateTime<Utc>) -> GrocerResult<GenerationReport> {
    let due = self.stores().subscriptions.list_due(now).await?;
    let mut report = GenerationReport::default();
    if due.is_empty() {
      debug!("No subscriptions due.");
      return Ok(report);
    }

    for subscription in due {
      match self.generate_one(&subscription, now).await? {
        Outcome::Generated(order) => report.generated.push(order),
        Outcome::Skipped(reason) => report.skipped.push(SkippedSubscription {
          subscription_id: subscription.id,
          reason,
        }),
      }
    }

    info!(
      generated = report.generated.len(),
      skipped = report.skipped.len(),
      "Subscription generation cycle finished."
    );
    Ok(report)
  }

  async fn generate_one(&self, subscription: &Subscription, now: DateTime<Utc>) -> GrocerResult<Outcome> {
    let stores = self.stores();
    let Some(product) = stores.products.get(subscription.product).await? else {
      warn!(subscription_id = %subscription.id, product_id = %subscription.product, "Skipping subscription, product missing.");
      return Ok(Outcome::Skipped(SkipReason::ProductMissing));
    };
    // Advance from the previous due date, not from `now`.
    let next_delivery = subscription
      .frequency
      .advance(subscription.next_delivery_date)
      .ok_or_else(|| GrocerError::Internal(format!("next delivery date out of range for {}", subscription.id)))?;

    if !stores
      .products
      .try_decrement_stock(product.id, subscription.quantity)
      .await?
    {
      warn!(
        subscription_id = %subscription.id,
        product = %product.name,
        "Skipping subscription order, insufficient stock."
      );
      return Ok(Outcome::Skipped(SkipReason::InsufficientStock));
    }

    let address = match stores.users.get(subscription.user).await? {
      Some(user) => user.address.filter(|a| !a.trim().is_empty()),
      None => None,
    };
    let total = product.price * Decimal::from(subscription.quantity);
    let order = Order {
      id: Uuid::new_v4(),
      user: subscription.user,
      order_items: vec![OrderItem {
        name: product.name.clone(),
        qty: subscription.quantity,
        image: product.image.clone(),
        price: product.price,
        product: product.id,
        is_subscription: false,
        frequency: None,
        start_date: None,
      }],
      shipping_address: ShippingAddress::street_only(address.unwrap_or_else(|| FALLBACK_ADDRESS.to_string())),
      payment_method: SUBSCRIPTION_PAYMENT.to_string(),
      items_price: total,
      shipping_price: Decimal::ZERO,
      tax_price: Decimal::ZERO,
      total_price: total,
      cod_charge: Decimal::ZERO,
      is_paid: false,
      paid_at: None,
      is_delivered: false,
      delivered_at: None,
      subscription_id: Some(subscription.id),
      order_status: OrderStatus::OrderPlaced,
      tracking_history: vec![TrackingEntry {
        status: OrderStatus::OrderPlaced,
        date: now,
        comment: GENERATED_COMMENT.to_string(),
      }],
      created_at: now,
      updated_at: now,
    };

    // Claim the period last: a cancel or another cycle may have moved the
    // subscription since `list_due` read it.
    let claimed = stores
      .subscriptions
      .advance_next_delivery(subscription.id, subscription.next_delivery_date, next_delivery, now)
      .await?;
    if !claimed {
      stores.products.restore_stock(product.id, subscription.quantity).await?;
      debug!(subscription_id = %subscription.id, "Delivery period already claimed or subscription no longer active.");
      return Ok(Outcome::Skipped(SkipReason::NoLongerDue));
    }

    if let Err(e) = stores.orders.insert(&order).await {
      stores.products.restore_stock(product.id, subscription.quantity).await?;
      stores
        .subscriptions
        .advance_next_delivery(subscription.id, next_delivery, subscription.next_delivery_date, now)
        .await?;
      return Err(e);
    }

    debug!(
      subscription_id = %subscription.id,
      order_id = %order.id,
      next_delivery = %next_delivery,
      "Subscription order generated."
    );
    Ok(Outcome::Generated(order))
  }
}
