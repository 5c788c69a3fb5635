// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use grocer::pipeline::Handler;
use grocer::{
  CartLine, Caller, CheckoutRequest, ContextData, Engine, GrocerError, GrocerResult, MemoryStore, Order, OrderStatus,
  OrderStore, PipelineControl, PipelineError, Product, ProductCatalog, ShippingAddress, Stores, Subscription,
  SubscriptionStatus, SubscriptionStore, TransitionPolicy, UserDirectory, UserProfile,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Pipeline runtime fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub compensated: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline error: {0}")]
  Pipeline(#[from] PipelineError),

  #[error("Test handler failed: {0}")]
  Handler(String),

  #[error("Test compensator failed: {0}")]
  Compensator(String),
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<PipelineControl, TestError>> + Send>>;
type CompensatorFuture = Pin<Box<dyn Future<Output = Result<(), TestError>> + Send>>;

pub fn create_simple_handler(step_name: &'static str, message_to_append: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| -> HandlerFuture {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(step_name: &'static str, error_message: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| -> HandlerFuture {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

pub fn record_compensation(step_name: &'static str) -> impl Fn(ContextData<TestContext>) -> CompensatorFuture + Send + Sync {
  move |ctx: ContextData<TestContext>| -> CompensatorFuture {
    Box::pin(async move {
      ctx.write().compensated.push(step_name.to_string());
      Ok(())
    })
  }
}

// --- Shop fixtures ---
pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

pub fn money(units: i64) -> Decimal {
  Decimal::new(units, 0)
}

pub fn address() -> ShippingAddress {
  ShippingAddress {
    address: "14 Palm Grove".to_string(),
    city: "Pune".to_string(),
    state: Some("Maharashtra".to_string()),
    postal_code: "411001".to_string(),
    landmark: None,
    place_type: Some("Home".to_string()),
    country: "India".to_string(),
  }
}

/// Prices 100 / 0 / 15 / 115, unpaid.
pub fn checkout_request(lines: Vec<CartLine>, payment_method: &str) -> CheckoutRequest {
  CheckoutRequest {
    order_items: lines,
    shipping_address: Some(address()),
    payment_method: Some(payment_method.to_string()),
    items_price: money(100),
    shipping_price: money(0),
    tax_price: money(15),
    total_price: money(115),
    cod_charge: None,
    is_paid: false,
  }
}

/// An engine over a fresh in-memory store, plus a handle to inspect it.
pub struct Shop {
  pub engine: Engine,
  pub store: MemoryStore,
}

impl Shop {
  pub fn new() -> Self {
    let store = MemoryStore::new();
    Self {
      engine: Engine::new(Stores::from_memory(store.clone())),
      store,
    }
  }

  pub fn with_policy(policy: TransitionPolicy) -> Self {
    let shop = Self::new();
    Self {
      engine: shop.engine.with_policy(policy),
      store: shop.store,
    }
  }

  /// Same store, but with some collaborators swapped out.
  pub fn with_stores(store: MemoryStore, stores: Stores) -> Self {
    Self {
      engine: Engine::new(stores),
      store,
    }
  }

  pub async fn add_product(&self, name: &str, price: i64, stock: u32) -> Product {
    let product = Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      image: format!("/images/{}.jpg", name.to_lowercase()),
      price: money(price),
      count_in_stock: stock,
      is_active: true,
      has_image: true,
    };
    self.engine.stores().products.put(&product).await.unwrap();
    product
  }

  pub async fn add_customer(&self, address: Option<&str>) -> Caller {
    let id = Uuid::new_v4();
    let profile = UserProfile {
      id,
      name: "Asha".to_string(),
      email: format!("{}@example.com", id.simple()),
      address: address.map(str::to_string),
      is_admin: false,
    };
    self.engine.stores().users.put(&profile).await.unwrap();
    Caller::user(id)
  }

  pub fn stock(&self, product: Uuid) -> u32 {
    self.store.stock_of(product).unwrap()
  }

  pub async fn subscription(&self, id: Uuid) -> Subscription {
    self.engine.stores().subscriptions.get(id).await.unwrap().unwrap()
  }
}

pub fn admin() -> Caller {
  Caller::admin(Uuid::new_v4())
}

// --- Misbehaving collaborators ---

/// A catalog whose reservation for one product always loses, as if another
/// checkout took the stock between validation and reservation.
pub struct RacingCatalog {
  pub inner: MemoryStore,
  pub loses_on: Uuid,
}

#[async_trait]
impl ProductCatalog for RacingCatalog {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<Product>> {
    ProductCatalog::get(&self.inner, id).await
  }

  async fn list(&self) -> GrocerResult<Vec<Product>> {
    ProductCatalog::list(&self.inner).await
  }

  async fn put(&self, product: &Product) -> GrocerResult<()> {
    ProductCatalog::put(&self.inner, product).await
  }

  async fn count(&self) -> GrocerResult<u64> {
    ProductCatalog::count(&self.inner).await
  }

  async fn try_decrement_stock(&self, id: Uuid, qty: u32) -> GrocerResult<bool> {
    if id == self.loses_on {
      return Ok(false);
    }
    self.inner.try_decrement_stock(id, qty).await
  }

  async fn restore_stock(&self, id: Uuid, qty: u32) -> GrocerResult<()> {
    self.inner.restore_stock(id, qty).await
  }
}

/// A subscription store that rejects every insert.
pub struct BrokenSubscriptions {
  pub inner: MemoryStore,
}

#[async_trait]
impl SubscriptionStore for BrokenSubscriptions {
  async fn insert(&self, _subscription: &Subscription) -> GrocerResult<()> {
    Err(GrocerError::storage(anyhow::anyhow!("subscriptions table is read-only")))
  }

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Subscription>> {
    SubscriptionStore::get(&self.inner, id).await
  }

  async fn update(&self, subscription: &Subscription) -> GrocerResult<bool> {
    SubscriptionStore::update(&self.inner, subscription).await
  }

  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Subscription>> {
    SubscriptionStore::list_for_user(&self.inner, user).await
  }

  async fn list_all(&self) -> GrocerResult<Vec<Subscription>> {
    SubscriptionStore::list_all(&self.inner).await
  }

  async fn advance_next_delivery(
    &self,
    id: Uuid,
    expected: DateTime<Utc>,
    next: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> GrocerResult<bool> {
    self.inner.advance_next_delivery(id, expected, next, now).await
  }

  async fn list_due(&self, now: DateTime<Utc>) -> GrocerResult<Vec<Subscription>> {
    self.inner.list_due(now).await
  }
}

/// A user directory that cancels every subscription whenever a profile is
/// read, as if the customer cancelled while a generation cycle was running.
pub struct CancellingUsers {
  pub inner: MemoryStore,
}

#[async_trait]
impl UserDirectory for CancellingUsers {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<UserProfile>> {
    for mut subscription in SubscriptionStore::list_all(&self.inner).await? {
      subscription.status = SubscriptionStatus::Cancelled;
      SubscriptionStore::update(&self.inner, &subscription).await?;
    }
    UserDirectory::get(&self.inner, id).await
  }

  async fn put(&self, user: &UserProfile) -> GrocerResult<()> {
    UserDirectory::put(&self.inner, user).await
  }

  async fn count(&self) -> GrocerResult<u64> {
    UserDirectory::count(&self.inner).await
  }
}

/// An order store where every write is preceded by a subscription
/// cancellation landing on the stored order, so the writer's copy is stale.
pub struct CancelledUnderfoot {
  pub inner: MemoryStore,
}

impl CancelledUnderfoot {
  async fn cancel_stored(&self, id: Uuid) -> GrocerResult<()> {
    let Some(stored) = OrderStore::get(&self.inner, id).await? else {
      return Ok(());
    };
    if !stored.order_status.is_not_yet_shipped() {
      return Ok(());
    }
    let expected = stored.order_status;
    let mut cancelled = stored;
    let when = cancelled.updated_at;
    cancelled.transition(
      TransitionPolicy::Permissive,
      OrderStatus::Cancelled,
      Some("Order cancelled due to subscription cancellation."),
      when,
    )?;
    OrderStore::update_if_status(&self.inner, &cancelled, expected).await?;
    Ok(())
  }
}

#[async_trait]
impl OrderStore for CancelledUnderfoot {
  async fn insert(&self, order: &Order) -> GrocerResult<()> {
    OrderStore::insert(&self.inner, order).await
  }

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Order>> {
    OrderStore::get(&self.inner, id).await
  }

  async fn update(&self, order: &Order) -> GrocerResult<bool> {
    self.cancel_stored(order.id).await?;
    OrderStore::update(&self.inner, order).await
  }

  async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> GrocerResult<bool> {
    self.cancel_stored(order.id).await?;
    OrderStore::update_if_status(&self.inner, order, expected).await
  }

  async fn list_all(&self) -> GrocerResult<Vec<Order>> {
    OrderStore::list_all(&self.inner).await
  }

  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Order>> {
    OrderStore::list_for_user(&self.inner, user).await
  }

  async fn list_for_subscription(&self, subscription_id: Uuid) -> GrocerResult<Vec<Order>> {
    OrderStore::list_for_subscription(&self.inner, subscription_id).await
  }

  async fn count(&self) -> GrocerResult<u64> {
    OrderStore::count(&self.inner).await
  }

  async fn paid_total(&self) -> GrocerResult<Decimal> {
    OrderStore::paid_total(&self.inner).await
  }

  async fn delete_all(&self) -> GrocerResult<u64> {
    OrderStore::delete_all(&self.inner).await
  }
}

pub fn stores_with(store: &MemoryStore, products: Option<Arc<dyn ProductCatalog>>, subscriptions: Option<Arc<dyn SubscriptionStore>>) -> Stores {
  let mut stores = Stores::from_memory(store.clone());
  if let Some(products) = products {
    stores.products = products;
  }
  if let Some(subscriptions) = subscriptions {
    stores.subscriptions = subscriptions;
  }
  stores
}
