// grocer_server/src/db/rows.rs

use super::corrupt;
use chrono::{DateTime, Utc};
use grocer::{
  GrocerResult, Order, OrderItem, Product, ShippingAddress, Subscription, TrackingEntry, UserProfile,
};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub(crate) fn to_u32(what: &str, value: i32) -> GrocerResult<u32> {
  u32::try_from(value).map_err(|_| corrupt(what, value))
}

pub(crate) fn to_i32(what: &str, value: u32) -> GrocerResult<i32> {
  i32::try_from(value).map_err(|_| corrupt(what, value))
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
  pub id: Uuid,
  pub name: String,
  pub image: String,
  pub price: Decimal,
  pub count_in_stock: i32,
  pub is_active: bool,
  pub has_image: bool,
}

impl TryFrom<ProductRow> for Product {
  type Error = grocer::GrocerError;

  fn try_from(row: ProductRow) -> GrocerResult<Self> {
    Ok(Product {
      id: row.id,
      name: row.name,
      image: row.image,
      price: row.price,
      count_in_stock: to_u32("count_in_stock", row.count_in_stock)?,
      is_active: row.is_active,
      has_image: row.has_image,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub address: Option<String>,
  pub is_admin: bool,
}

impl From<UserRow> for UserProfile {
  fn from(row: UserRow) -> Self {
    UserProfile {
      id: row.id,
      name: row.name,
      email: row.email,
      address: row.address,
      is_admin: row.is_admin,
    }
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct OrderRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub order_items: Json<Vec<OrderItem>>,
  pub shipping_address: Json<ShippingAddress>,
  pub payment_method: String,
  pub items_price: Decimal,
  pub shipping_price: Decimal,
  pub tax_price: Decimal,
  pub total_price: Decimal,
  pub cod_charge: Decimal,
  pub is_paid: bool,
  pub paid_at: Option<DateTime<Utc>>,
  pub is_delivered: bool,
  pub delivered_at: Option<DateTime<Utc>>,
  pub subscription_id: Option<Uuid>,
  pub order_status: String,
  pub tracking_history: Json<Vec<TrackingEntry>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = grocer::GrocerError;

  fn try_from(row: OrderRow) -> GrocerResult<Self> {
    Ok(Order {
      id: row.id,
      user: row.user_id,
      order_items: row.order_items.0,
      shipping_address: row.shipping_address.0,
      payment_method: row.payment_method,
      items_price: row.items_price,
      shipping_price: row.shipping_price,
      tax_price: row.tax_price,
      total_price: row.total_price,
      cod_charge: row.cod_charge,
      is_paid: row.is_paid,
      paid_at: row.paid_at,
      is_delivered: row.is_delivered,
      delivered_at: row.delivered_at,
      subscription_id: row.subscription_id,
      order_status: row.order_status.parse().map_err(|e| corrupt("order_status", e))?,
      tracking_history: row.tracking_history.0,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct SubscriptionRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub frequency: String,
  pub start_date: DateTime<Utc>,
  pub end_date: Option<DateTime<Utc>>,
  pub duration: Option<String>,
  pub billing_type: String,
  pub next_delivery_date: DateTime<Utc>,
  pub status: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
  type Error = grocer::GrocerError;

  fn try_from(row: SubscriptionRow) -> GrocerResult<Self> {
    Ok(Subscription {
      id: row.id,
      user: row.user_id,
      product: row.product_id,
      quantity: to_u32("quantity", row.quantity)?,
      frequency: row.frequency.parse().map_err(|e| corrupt("frequency", e))?,
      start_date: row.start_date,
      end_date: row.end_date,
      duration: row.duration,
      billing_type: row.billing_type.parse().map_err(|e| corrupt("billing_type", e))?,
      next_delivery_date: row.next_delivery_date,
      status: row.status.parse().map_err(|e| corrupt("status", e))?,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub(crate) fn collect<R, T>(rows: Vec<R>) -> GrocerResult<Vec<T>>
where
  T: TryFrom<R, Error = grocer::GrocerError>,
{
  rows.into_iter().map(T::try_from).collect()
}
