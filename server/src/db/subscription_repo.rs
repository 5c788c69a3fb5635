// grocer_server/src/db/subscription_repo.rs

use super::rows::{collect, to_i32, SubscriptionRow};
use super::{storage, PgStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grocer::{GrocerResult, Subscription, SubscriptionStore};
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, product_id, quantity, frequency, start_date, end_date, \
  duration, billing_type, next_delivery_date, status, created_at, updated_at";

#[async_trait]
impl SubscriptionStore for PgStore {
  async fn insert(&self, subscription: &Subscription) -> GrocerResult<()> {
    sqlx::query(&format!(
      "INSERT INTO subscriptions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
      SUBSCRIPTION_COLUMNS
    ))
    .bind(subscription.id)
    .bind(subscription.user)
    .bind(subscription.product)
    .bind(to_i32("quantity", subscription.quantity)?)
    .bind(subscription.frequency.as_str())
    .bind(subscription.start_date)
    .bind(subscription.end_date)
    .bind(&subscription.duration)
    .bind(subscription.billing_type.as_str())
    .bind(subscription.next_delivery_date)
    .bind(subscription.status.as_str())
    .bind(subscription.created_at)
    .bind(subscription.updated_at)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(())
  }

  async fn get(&self, id: Uuid) -> GrocerResult<Option<Subscription>> {
    let row: Option<SubscriptionRow> =
      sqlx::query_as(&format!("SELECT {} FROM subscriptions WHERE id = $1", SUBSCRIPTION_COLUMNS))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage)?;
    row.map(Subscription::try_from).transpose()
  }

  async fn update(&self, subscription: &Subscription) -> GrocerResult<bool> {
    let result = sqlx::query(
      "UPDATE subscriptions SET
         quantity = $2, frequency = $3, end_date = $4, duration = $5, billing_type = $6,
         status = $7, updated_at = $8
       WHERE id = $1 AND (status <> 'cancelled' OR $7 = 'cancelled')",
    )
    .bind(subscription.id)
    .bind(to_i32("quantity", subscription.quantity)?)
    .bind(subscription.frequency.as_str())
    .bind(subscription.end_date)
    .bind(&subscription.duration)
    .bind(subscription.billing_type.as_str())
    .bind(subscription.status.as_str())
    .bind(subscription.updated_at)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(result.rows_affected() == 1)
  }

  async fn advance_next_delivery(
    &self,
    id: Uuid,
    expected: DateTime<Utc>,
    next: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> GrocerResult<bool> {
    let result = sqlx::query(
      "UPDATE subscriptions SET next_delivery_date = $3, updated_at = $4
       WHERE id = $1 AND status = 'active' AND next_delivery_date = $2",
    )
    .bind(id)
    .bind(expected)
    .bind(next)
    .bind(now)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(result.rows_affected() == 1)
  }

  async fn list_for_user(&self, user: Uuid) -> GrocerResult<Vec<Subscription>> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
      "SELECT {} FROM subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
      SUBSCRIPTION_COLUMNS
    ))
    .bind(user)
    .fetch_all(self.pool())
    .await
    .map_err(storage)?;
    collect(rows)
  }

  async fn list_all(&self) -> GrocerResult<Vec<Subscription>> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
      "SELECT {} FROM subscriptions ORDER BY created_at DESC",
      SUBSCRIPTION_COLUMNS
    ))
    .fetch_all(self.pool())
    .await
    .map_err(storage)?;
    collect(rows)
  }

  async fn list_due(&self, now: DateTime<Utc>) -> GrocerResult<Vec<Subscription>> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
      "SELECT {} FROM subscriptions
       WHERE status = 'active' AND next_delivery_date <= $1
       ORDER BY next_delivery_date ASC",
      SUBSCRIPTION_COLUMNS
    ))
    .bind(now)
    .fetch_all(self.pool())
    .await
    .map_err(storage)?;
    collect(rows)
  }
}
