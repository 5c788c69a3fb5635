// grocer/src/checkout/context.rs

use crate::checkout::CheckoutRequest;
use crate::model::{Order, Product, Subscription};
use crate::store::Stores;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Stock taken from one product during `reserve_stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
  pub product: Uuid,
  pub qty: u32,
}

/// Data threaded through the `checkout` pipeline.
///
/// Each step records what it did here, and the compensators undo exactly
/// what is recorded: `reservations` for stock, `order` once it is persisted,
/// `subscriptions` once each one is persisted.
#[derive(Debug)]
pub struct CheckoutCtxData {
  pub stores: Stores,
  pub customer: Uuid,
  pub request: CheckoutRequest,
  pub now: DateTime<Utc>,

  /// Catalog records read by `validate_stock`, keyed by product id.
  pub catalog: HashMap<Uuid, Product>,
  pub reservations: Vec<Reservation>,
  pub order: Option<Order>,
  pub subscriptions: Vec<Subscription>,
}

impl CheckoutCtxData {
  pub fn new(stores: Stores, customer: Uuid, request: CheckoutRequest, now: DateTime<Utc>) -> Self {
    Self {
      stores,
      customer,
      request,
      now,
      catalog: HashMap::new(),
      reservations: Vec::new(),
      order: None,
      subscriptions: Vec::new(),
    }
  }

  pub fn has_subscription_lines(&self) -> bool {
    self.request.order_items.iter().any(|line| line.is_subscription)
  }
}
