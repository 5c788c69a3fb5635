// grocer_server/src/db/order_repo.rs

use super::rows::{collect, OrderRow};
use super::{storage, PgStore};
use async_trait::async_trait;
use grocer::{GrocerResult, Order, OrderStatus, OrderStore};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, order_items, shipping_address, payment_method, \
  items_price, shipping_price, tax_price, total_price, cod_charge, \
  is_paid, paid_at, is_delivered, delivered_at, subscription_id, \
  order_status, tracking_history, created_at, updated_at";

// Columns an order update may touch; $1 is always the id.
const UPDATE_ORDER: &str = "UPDATE orders SET
  is_paid = $2, paid_at = $3, is_delivered = $4, delivered_at = $5,
  subscription_id = $6, order_status = $7, tracking_history = $8, updated_at = $9
  WHERE id = $1";

fn bind_update<'q>(
  query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
  order: &'q Order,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
  query
    .bind(order.id)
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(order.is_delivered)
    .bind(order.delivered_at)
    .bind(order.subscription_id)
    .bind(order.order_status.as_str())
    .bind(Json(&order.tracking_history))
    .bind(order.updated_at)
}

impl PgStore {
  async fn fetch_orders(&self, sql: &str, bind: Option<Uuid>) -> GrocerResult<Vec<Order>> {
    let mut query = sqlx::query_as::<_, OrderRow>(sql);
    if let Some(id) = bind {
      query = query.bind(id);
    }
    let rows = query.fetch_all(self.pool()).await.map_err(storage)?;
    collect(rows)
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn insert(&self, order: &Order) -> GrocerResult<()> {
    sqlx::query(&format!(
      "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
      ORDER_COLUMNS
    ))
    .bind(order.id)
    .bind(order.user)
    .bind(Json(&order.order_items))
    .bind(Json(&order.shipping_address))
    .bind(&order.payment_method)
    .bind(order.items_price)
    .bind(order.shipping_price)
    .bind(order.tax_price)
    .bind(order.total_price)
    .bind(order.cod_charge)
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(order.is_delivered)
    .bind(order.delivered_at)
    .bind(order.subscription_id)
    .bind(order.order_status.as_str())
    .bind(Json(&order.tracking_history))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(())
  }

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(self.pool())
      .await
      .map_err(storage)?;
    row.map(Order::try_from).transpose()
  }

  async fn update(&self, order: &Order) -> GrocerResult<bool> {
    let result = bind_update(sqlx::query(UPDATE_ORDER), order)
      .execute(self.pool())
      .await
      .map_err(storage)?;
    Ok(result.rows_affected() == 1)
  }

  async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> GrocerResult<bool> {
    let sql = format!("{} AND order_status = $10", UPDATE_ORDER);
    let result = bind_update(sqlx::query(&sql), order)
      .bind(expected.as_str())
      .execute(self.pool())
      .await
      .map_err(storage)?;
    Ok(result.rows_affected() == 1)
  }

  async fn list_all(&self) -> GrocerResult<Vec<Order>> {
    self
      .fetch_orders(&format!("SELECT {} FROM orders ORDER BY created_at DESC", ORDER_COLUMNS), None)
      .await
  }

  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Order>> {
    self
      .fetch_orders(
        &format!("SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC", ORDER_COLUMNS),
        Some(user),
      )
      .await
  }

  async fn list_for_subscription(&self, subscription_id: Uuid) -> GrocerResult<Vec<Order>> {
    self
      .fetch_orders(
        &format!("SELECT {} FROM orders WHERE subscription_id = $1 ORDER BY created_at ASC", ORDER_COLUMNS),
        Some(subscription_id),
      )
      .await
  }

  async fn count(&self) -> GrocerResult<u64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
      .fetch_one(self.pool())
      .await
      .map_err(storage)?;
    Ok(n.max(0) as u64)
  }

  async fn paid_total(&self) -> GrocerResult<Decimal> {
    sqlx::query_scalar("SELECT COALESCE(SUM(total_price), 0) FROM orders WHERE is_paid")
      .fetch_one(self.pool())
      .await
      .map_err(storage)
  }

  async fn delete_all(&self) -> GrocerResult<u64> {
    let result = sqlx::query("DELETE FROM orders")
      .execute(self.pool())
      .await
      .map_err(storage)?;
    Ok(result.rows_affected())
  }
}
