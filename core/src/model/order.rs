// grocer/src/model/order.rs

use crate::model::subscription::Frequency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const CASH_ON_DELIVERY: &str = "Cash on Delivery";
pub const SUBSCRIPTION_PAYMENT: &str = "Subscription";

/// Lifecycle position of an order. Legal moves between these are decided by
/// [`TransitionPolicy`](crate::lifecycle::TransitionPolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
  #[serde(rename = "Order Placed")]
  OrderPlaced,
  Confirmed,
  Packed,
  Shipped,
  #[serde(rename = "Out for Delivery")]
  OutForDelivery,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 7] = [
    OrderStatus::OrderPlaced,
    OrderStatus::Confirmed,
    OrderStatus::Packed,
    OrderStatus::Shipped,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  /// Statuses a subscription cancellation can still reach.
  pub const NOT_YET_SHIPPED: [OrderStatus; 3] =
    [OrderStatus::OrderPlaced, OrderStatus::Confirmed, OrderStatus::Packed];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::OrderPlaced => "Order Placed",
      OrderStatus::Confirmed => "Confirmed",
      OrderStatus::Packed => "Packed",
      OrderStatus::Shipped => "Shipped",
      OrderStatus::OutForDelivery => "Out for Delivery",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Cancelled => "Cancelled",
    }
  }

  /// Position along the delivery lifecycle; `None` for `Cancelled`.
  pub fn stage(&self) -> Option<u8> {
    match self {
      OrderStatus::OrderPlaced => Some(0),
      OrderStatus::Confirmed => Some(1),
      OrderStatus::Packed => Some(2),
      OrderStatus::Shipped => Some(3),
      OrderStatus::OutForDelivery => Some(4),
      OrderStatus::Delivered => Some(5),
      OrderStatus::Cancelled => None,
    }
  }

  pub fn is_not_yet_shipped(&self) -> bool {
    Self::NOT_YET_SHIPPED.contains(self)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown order status '{}'", s))
  }
}

/// Snapshot of a purchased line, frozen at order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub name: String,
  pub qty: u32,
  pub image: String,
  pub price: Decimal,
  pub product: Uuid,
  // Subscription metadata only; it never drives billing.
  #[serde(default)]
  pub is_subscription: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub frequency: Option<Frequency>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<DateTime<Utc>>,
}

fn default_country() -> String {
  "India".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub address: String,
  #[serde(default)]
  pub city: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state: Option<String>,
  #[serde(default)]
  pub postal_code: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub landmark: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub place_type: Option<String>,
  #[serde(default = "default_country")]
  pub country: String,
}

impl ShippingAddress {
  /// An address carrying only a street line, as used for generated orders.
  pub fn street_only(address: impl Into<String>) -> Self {
    Self {
      address: address.into(),
      city: String::new(),
      state: None,
      postal_code: String::new(),
      landmark: None,
      place_type: None,
      country: default_country(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
  pub status: OrderStatus,
  pub date: DateTime<Utc>,
  pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user: Uuid,
  pub order_items: Vec<OrderItem>,
  pub shipping_address: ShippingAddress,
  pub payment_method: String,

  // Stored as supplied; never recomputed from the items.
  pub items_price: Decimal,
  pub shipping_price: Decimal,
  pub tax_price: Decimal,
  pub total_price: Decimal,
  pub cod_charge: Decimal,

  pub is_paid: bool,
  pub paid_at: Option<DateTime<Utc>>,
  pub is_delivered: bool,
  pub delivered_at: Option<DateTime<Utc>>,

  /// Weak back-reference used for lookup and cancellation sync only.
  pub subscription_id: Option<Uuid>,
  pub order_status: OrderStatus,
  /// Append-only, in chronological order.
  pub tracking_history: Vec<TrackingEntry>,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn is_cash_on_delivery(&self) -> bool {
    self.payment_method == CASH_ON_DELIVERY
  }

  pub fn last_tracking_entry(&self) -> Option<&TrackingEntry> {
    self.tracking_history.last()
  }

  pub(crate) fn push_tracking(&mut self, status: OrderStatus, comment: impl Into<String>, now: DateTime<Utc>) {
    self.tracking_history.push(TrackingEntry {
      status,
      date: now,
      comment: comment.into(),
    });
    self.updated_at = now;
  }
}
