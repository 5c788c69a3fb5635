// grocer_server/src/db/product_repo.rs

use super::rows::{collect, to_i32, ProductRow};
use super::{storage, PgStore};
use async_trait::async_trait;
use grocer::{GrocerResult, Product, ProductCatalog};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, image, price, count_in_stock, is_active, has_image";

#[async_trait]
impl ProductCatalog for PgStore {
  async fn get(&self, id: Uuid) -> GrocerResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(self.pool())
      .await
      .map_err(storage)?;
    row.map(Product::try_from).transpose()
  }

  async fn list(&self) -> GrocerResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products ORDER BY name ASC", PRODUCT_COLUMNS))
      .fetch_all(self.pool())
      .await
      .map_err(storage)?;
    collect(rows)
  }

  async fn put(&self, product: &Product) -> GrocerResult<()> {
    sqlx::query(
      "INSERT INTO products (id, name, image, price, count_in_stock, is_active, has_image)
       VALUES ($1, $2, $3, $4, $5, $6, $7)
       ON CONFLICT (id) DO UPDATE SET
         name = EXCLUDED.name,
         image = EXCLUDED.image,
         price = EXCLUDED.price,
         count_in_stock = EXCLUDED.count_in_stock,
         is_active = EXCLUDED.is_active,
         has_image = EXCLUDED.has_image,
         updated_at = NOW()",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.image)
    .bind(product.price)
    .bind(to_i32("count_in_stock", product.count_in_stock)?)
    .bind(product.is_active)
    .bind(product.has_image)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(())
  }

  async fn count(&self) -> GrocerResult<u64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
      .fetch_one(self.pool())
      .await
      .map_err(storage)?;
    Ok(n.max(0) as u64)
  }

  async fn try_decrement_stock(&self, id: Uuid, qty: u32) -> GrocerResult<bool> {
    let result = sqlx::query(
      "UPDATE products SET count_in_stock = count_in_stock - $2, updated_at = NOW()
       WHERE id = $1 AND count_in_stock >= $2",
    )
    .bind(id)
    .bind(to_i32("qty", qty)?)
    .execute(self.pool())
    .await
    .map_err(storage)?;
    Ok(result.rows_affected() == 1)
  }

  async fn restore_stock(&self, id: Uuid, qty: u32) -> GrocerResult<()> {
    sqlx::query("UPDATE products SET count_in_stock = count_in_stock + $2, updated_at = NOW() WHERE id = $1")
      .bind(id)
      .bind(to_i32("qty", qty)?)
      .execute(self.pool())
      .await
      .map_err(storage)?;
    Ok(())
  }
}
