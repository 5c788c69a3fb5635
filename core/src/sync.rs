// grocer/src/sync.rs

//! Propagates a subscription cancellation to its linked orders.

use crate::engine::Engine;
use crate::error::GrocerResult;
use crate::model::OrderStatus;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const SUBSCRIPTION_CANCELLED_COMMENT: &str = "Order cancelled due to subscription cancellation.";

impl Engine {
  /// Cancels every not-yet-shipped order generated for `subscription_id` and
  /// returns the ids of the orders it cancelled.
  ///
  /// Each order is written only while it still holds the status it was read
  /// with; one that moved on in the meantime (e.g. got shipped) is left alone.
  #[instrument(name = "Engine::cancel_linked_orders", skip(self), err(Display))]
  pub async fn cancel_linked_orders(&self, subscription_id: Uuid, now: DateTime<Utc>) -> GrocerResult<Vec<Uuid>> {
    let orders = self.stores().orders.list_for_subscription(subscription_id).await?;

    let mut cancelled = Vec::new();
    for mut order in orders.into_iter().filter(|o| o.order_status.is_not_yet_shipped()) {
      let expected = order.order_status;
      order.enter_status(OrderStatus::Cancelled, SUBSCRIPTION_CANCELLED_COMMENT, now);
      if self.stores().orders.update_if_status(&order, expected).await? {
        cancelled.push(order.id);
      } else {
        debug!(order_id = %order.id, "Order status changed concurrently, not cancelled.");
      }
    }

    info!(cancelled = cancelled.len(), "Linked orders cancelled.");
    Ok(cancelled)
  }
}
