// grocer/src/orders.rs

//! Order reads and admin status operations.

use crate::engine::Engine;
use crate::error::{GrocerError, GrocerResult};
use crate::model::{Caller, Order, OrderStatus};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

impl Engine {
  /// One order, visible to its owner and to admins.
  pub async fn get_order(&self, caller: &Caller, id: Uuid) -> GrocerResult<Order> {
    let order = self.load_order(id).await?;
    if !caller.may_access(order.user) {
      return Err(GrocerError::Unauthorized("Not authorized to view this order".to_string()));
    }
    Ok(order)
  }

  /// The caller's orders, newest first.
  pub async fn list_my_orders(&self, caller: &Caller) -> GrocerResult<Vec<Order>> {
    self.stores().orders.list_for_user(caller.user_id).await
  }

  /// Every order, newest first.
  pub async fn list_orders(&self) -> GrocerResult<Vec<Order>> {
    self.stores().orders.list_all().await
  }

  #[instrument(name = "Engine::update_order_status", skip(self, comment), err(Display))]
  pub async fn update_order_status(
    &self,
    id: Uuid,
    status: OrderStatus,
    comment: Option<&str>,
    now: DateTime<Utc>,
  ) -> GrocerResult<Order> {
    let mut order = self.load_order(id).await?;
    let from = order.order_status;
    order.transition(self.policy(), status, comment, now)?;
    self.save_order(&order, from).await?;
    info!(order_id = %id, %from, to = %status, "Order status updated.");
    Ok(order)
  }

  #[instrument(name = "Engine::mark_delivered", skip(self), err(Display))]
  pub async fn mark_delivered(&self, id: Uuid, now: DateTime<Utc>) -> GrocerResult<Order> {
    let mut order = self.load_order(id).await?;
    let from = order.order_status;
    order.mark_delivered(self.policy(), now)?;
    self.save_order(&order, from).await?;
    info!(order_id = %id, paid = order.is_paid, "Order delivered.");
    Ok(order)
  }

  /// Deletes every order. Only reachable from the administrative tooling.
  #[instrument(name = "Engine::reset_orders", skip(self), err(Display))]
  pub async fn reset_orders(&self) -> GrocerResult<u64> {
    let removed = self.stores().orders.delete_all().await?;
    info!(removed, "All orders deleted.");
    Ok(removed)
  }

  async fn load_order(&self, id: Uuid) -> GrocerResult<Order> {
    self
      .stores()
      .orders
      .get(id)
      .await?
      .ok_or_else(|| GrocerError::not_found("Order", id))
  }

  /// Writes `order` only while the stored status is still `from`, so a
  /// concurrent change (such as a subscription cancellation) is never
  /// overwritten.
  async fn save_order(&self, order: &Order, from: OrderStatus) -> GrocerResult<()> {
    if self.stores().orders.update_if_status(order, from).await? {
      return Ok(());
    }
    match self.stores().orders.get(order.id).await? {
      Some(current) => Err(GrocerError::Conflict(format!(
        "Order status changed to {} while this update was in progress",
        current.order_status
      ))),
      None => Err(GrocerError::not_found("Order", order.id)),
    }
  }
}
