// grocer/src/store/memory.rs

//! In-memory stores, used by tests and by the server's `memory` backend.

use crate::error::GrocerResult;
use crate::model::{Order, OrderStatus, Product, Subscription, SubscriptionStatus, UserProfile};
use crate::store::{OrderStore, ProductCatalog, SubscriptionStore, UserDirectory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  products: HashMap<Uuid, Product>,
  // Insertion order doubles as creation order for ties on created_at.
  orders: Vec<Order>,
  subscriptions: Vec<Subscription>,
  users: HashMap<Uuid, UserProfile>,
}

/// Every table behind a single lock, so a stock check-and-decrement is atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Current stock of a product, or `None` if it does not exist.
  pub fn stock_of(&self, id: Uuid) -> Option<u32> {
    self.tables.read().products.get(&id).map(|p| p.count_in_stock)
  }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
  // Stable sort on a reversed vec keeps later insertions first on ties.
  items.reverse();
  items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
  items
}

#[async_trait]
impl ProductCatalog for MemoryStore {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<Product>> {
    Ok(self.tables.read().products.get(&id).cloned())
  }

  async fn list(&self) -> GrocerResult<Vec<Product>> {
    let mut products: Vec<Product> = self.tables.read().products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn put(&self, product: &Product) -> GrocerResult<()> {
    self.tables.write().products.insert(product.id, product.clone());
    Ok(())
  }

  async fn count(&self) -> GrocerResult<u64> {
    Ok(self.tables.read().products.len() as u64)
  }

  async fn try_decrement_stock(&self, id: Uuid, qty: u32) -> GrocerResult<bool> {
    let mut tables = self.tables.write();
    match tables.products.get_mut(&id) {
      Some(product) if product.count_in_stock >= qty => {
        product.count_in_stock -= qty;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn restore_stock(&self, id: Uuid, qty: u32) -> GrocerResult<()> {
    if let Some(product) = self.tables.write().products.get_mut(&id) {
      product.count_in_stock = product.count_in_stock.saturating_add(qty);
    }
    Ok(())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn insert(&self, order: &Order) -> GrocerResult<()> {
    self.tables.write().orders.push(order.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Order>> {
    Ok(self.tables.read().orders.iter().find(|o| o.id == id).cloned())
  }

  async fn update(&self, order: &Order) -> GrocerResult<bool> {
    let mut tables = self.tables.write();
    match tables.orders.iter_mut().find(|o| o.id == order.id) {
      Some(slot) => {
        *slot = order.clone();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> GrocerResult<bool> {
    let mut tables = self.tables.write();
    match tables
      .orders
      .iter_mut()
      .find(|o| o.id == order.id && o.order_status == expected)
    {
      Some(slot) => {
        *slot = order.clone();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn list_all(&self) -> GrocerResult<Vec<Order>> {
    let orders = self.tables.read().orders.clone();
    Ok(newest_first(orders, |o| o.created_at))
  }

  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Order>> {
    let orders = self
      .tables
      .read()
      .orders
      .iter()
      .filter(|o| o.user == user)
      .cloned()
      .collect();
    Ok(newest_first(orders, |o| o.created_at))
  }

  async fn list_for_subscription(&self, subscription_id: Uuid) -> GrocerResult<Vec<Order>> {
    Ok(
      self
        .tables
        .read()
        .orders
        .iter()
        .filter(|o| o.subscription_id == Some(subscription_id))
        .cloned()
        .collect(),
    )
  }

  async fn count(&self) -> GrocerResult<u64> {
    Ok(self.tables.read().orders.len() as u64)
  }

  async fn paid_total(&self) -> GrocerResult<Decimal> {
    Ok(
      self
        .tables
        .read()
        .orders
        .iter()
        .filter(|o| o.is_paid)
        .map(|o| o.total_price)
        .sum(),
    )
  }

  async fn delete_all(&self) -> GrocerResult<u64> {
    let mut tables = self.tables.write();
    let removed = tables.orders.len() as u64;
    tables.orders.clear();
    Ok(removed)
  }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
  async fn insert(&self, subscription: &Subscription) -> GrocerResult<()> {
    self.tables.write().subscriptions.push(subscription.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Subscription>> {
    Ok(self.tables.read().subscriptions.iter().find(|s| s.id == id).cloned())
  }

  async fn update(&self, subscription: &Subscription) -> GrocerResult<bool> {
    let mut tables = self.tables.write();
    let Some(slot) = tables.subscriptions.iter_mut().find(|s| s.id == subscription.id) else {
      return Ok(false);
    };
    if slot.status == SubscriptionStatus::Cancelled && subscription.status != SubscriptionStatus::Cancelled {
      return Ok(false);
    }
    slot.quantity = subscription.quantity;
    slot.frequency = subscription.frequency;
    slot.end_date = subscription.end_date;
    slot.duration = subscription.duration.clone();
    slot.billing_type = subscription.billing_type;
    slot.status = subscription.status;
    slot.updated_at = subscription.updated_at;
    Ok(true)
  }

  async fn advance_next_delivery(
    &self,
    id: Uuid,
    expected: DateTime<Utc>,
    next: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> GrocerResult<bool> {
    let mut tables = self.tables.write();
    match tables
      .subscriptions
      .iter_mut()
      .find(|s| s.id == id && s.status == SubscriptionStatus::Active && s.next_delivery_date == expected)
    {
      Some(slot) => {
        slot.next_delivery_date = next;
        slot.updated_at = now;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Subscription>> {
    let subs = self
      .tables
      .read()
      .subscriptions
      .iter()
      .filter(|s| s.user == user)
      .cloned()
      .collect();
    Ok(newest_first(subs, |s| s.created_at))
  }

  async fn list_all(&self) -> GrocerResult<Vec<Subscription>> {
    let subs = self.tables.read().subscriptions.clone();
    Ok(newest_first(subs, |s| s.created_at))
  }

  async fn list_due(&self, now: DateTime<Utc>) -> GrocerResult<Vec<Subscription>> {
    let mut due: Vec<Subscription> = self
      .tables
      .read()
      .subscriptions
      .iter()
      .filter(|s| s.status == SubscriptionStatus::Active && s.next_delivery_date <= now)
      .cloned()
      .collect();
    due.sort_by_key(|s| s.next_delivery_date);
    Ok(due)
  }
}

#[async_trait]
impl UserDirectory for MemoryStore {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<UserProfile>> {
    Ok(self.tables.read().users.get(&id).cloned())
  }

  async fn put(&self, user: &UserProfile) -> GrocerResult<()> {
    self.tables.write().users.insert(user.id, user.clone());
    Ok(())
  }

  async fn count(&self) -> GrocerResult<u64> {
    Ok(self.tables.read().users.len() as u64)
  }
}
