// grocer/src/store/mod.rs

//! Persistence seams.
//!
//! The engine never talks to a database directly. Each collaborator is a
//! trait object so the same services run over PostgreSQL in the server and
//! over [`MemoryStore`] in tests. Stores are plain record stores: no
//! transactions are assumed, and every multi-record invariant is kept by the
//! engine itself.

pub mod memory;

use crate::error::GrocerResult;
use crate::model::{Order, OrderStatus, Product, Subscription, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<Product>>;

  async fn list(&self) -> GrocerResult<Vec<Product>>;

  /// Inserts or replaces a product.
  async fn put(&self, product: &Product) -> GrocerResult<()>;

  async fn count(&self) -> GrocerResult<u64>;

  /// Decrements `count_in_stock` by `qty` only if at least `qty` is in stock.
  ///
  /// The check and the decrement are one atomic operation. Returns `false`
  /// (and changes nothing) when the product is missing or short.
  async fn try_decrement_stock(&self, id: Uuid, qty: u32) -> GrocerResult<bool>;

  /// Gives back stock taken by [`try_decrement_stock`](Self::try_decrement_stock).
  async fn restore_stock(&self, id: Uuid, qty: u32) -> GrocerResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn insert(&self, order: &Order) -> GrocerResult<()>;

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Order>>;

  /// Overwrites an existing order. Returns `false` if it no longer exists.
  async fn update(&self, order: &Order) -> GrocerResult<bool>;

  /// Overwrites the order only while its stored status is still `expected`.
  async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> GrocerResult<bool>;

  /// Newest first.
  async fn list_all(&self) -> GrocerResult<Vec<Order>>;

  /// Newest first.
  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Order>>;

  async fn list_for_subscription(&self, subscription_id: Uuid) -> GrocerResult<Vec<Order>>;

  async fn count(&self) -> GrocerResult<u64>;

  /// Sum of `total_price` over paid orders.
  async fn paid_total(&self) -> GrocerResult<Decimal>;

  /// Removes every order, returning how many were removed.
  async fn delete_all(&self) -> GrocerResult<u64>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
  async fn insert(&self, subscription: &Subscription) -> GrocerResult<()>;

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Subscription>>;

  /// Overwrites the customer-editable fields and `status`.
  ///
  /// `next_delivery_date` is left alone; only
  /// [`advance_next_delivery`](Self::advance_next_delivery) moves it. A stored
  /// `cancelled` subscription is never moved to another status. Returns
  /// `false` when the subscription is missing or that guard refused the write.
  async fn update(&self, subscription: &Subscription) -> GrocerResult<bool>;

  /// Moves `next_delivery_date` from `expected` to `next` while the
  /// subscription is still active and still due at `expected`.
  ///
  /// This is how a generation cycle claims one delivery period: of two cycles
  /// racing for the same period only one sees `true`.
  async fn advance_next_delivery(
    &self,
    id: Uuid,
    expected: DateTime<Utc>,
    next: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> GrocerResult<bool>;

  /// Newest first.
  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Subscription>>;

  /// Newest first.
  async fn list_all(&self) -> GrocerResult<Vec<Subscription>>;

  /// Active subscriptions whose `next_delivery_date <= now`, oldest due first.
  async fn list_due(&self, now: DateTime<Utc>) -> GrocerResult<Vec<Subscription>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<UserProfile>>;

  async fn put(&self, user: &UserProfile) -> GrocerResult<()>;

  async fn count(&self) -> GrocerResult<u64>;
}

/// The set of collaborators an [`Engine`](crate::Engine) runs against.
#[derive(Clone)]
pub struct Stores {
  pub products: Arc<dyn ProductCatalog>,
  pub orders: Arc<dyn OrderStore>,
  pub subscriptions: Arc<dyn SubscriptionStore>,
  pub users: Arc<dyn UserDirectory>,
}

impl Stores {
  /// All four collaborators backed by one fresh [`MemoryStore`].
  pub fn in_memory() -> Self {
    Self::from_memory(MemoryStore::new())
  }

  pub fn from_memory(store: MemoryStore) -> Self {
    let store = Arc::new(store);
    Self {
      products: store.clone(),
      orders: store.clone(),
      subscriptions: store.clone(),
      users: store,
    }
  }
}

impl std::fmt::Debug for Stores {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Stores").finish_non_exhaustive()
  }
}
