// grocer_server/src/db/user_repo.rs

use super::rows::UserRow;
use super::{storage, PgStore};
use async_trait::async_trait;
use grocer::{GrocerResult, UserDirectory, UserProfile};
use uuid::Uuid;

#[async_trait]
impl UserDirectory for PgStore {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<UserProfile>> {
    let row: Option<UserRow> = sqlx::query_as("SELECT id, name, email, address, is_admin FROM users WHERE id = $1")
      .bind(id)
      .fetch_optional(self.pool())
      .await
      .map_err(storage)?;
    Ok(row.map(UserProfile::from))
  }

  async fn put(&self, user: &UserProfile) -> GrocerResult<()> {
    sqlx::query(
      "INSERT INTO users (id, name, email, address, is_admin)
       VALUES ($1, $2, $3, $4, $5)
       ON CONFLICT (id) DO UPDATE SET
         name = EXCLUDED.name,
         email = EXCLUDED.email,
         address = EXCLUDED.address,
         is_admin = EXCLUDED.is_admin",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.address)
    .bind(user.is_admin)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(())
  }

  async fn count(&self) -> GrocerResult<u64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
      .fetch_one(self.pool())
      .await
      .map_err(storage)?;
    Ok(n.max(0) as u64)
  }
}
