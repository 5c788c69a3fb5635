// grocer_server/src/seed.rs

//! Demo catalog and accounts written on startup when `SEED_DB=true`.
//!
//! Ids are fixed so reseeding upserts the same rows instead of duplicating them.

use grocer::{GrocerResult, Product, Stores, UserProfile};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

pub const ADMIN_ID: Uuid = Uuid::from_u128(0x6a0d_1f3e_0000_4000_8000_0000_0000_0001);
pub const CUSTOMER_ID: Uuid = Uuid::from_u128(0x6a0d_1f3e_0000_4000_8000_0000_0000_0002);

const PRODUCTS: &[(u128, &str, i64, u32)] = &[
  (0x01, "Fresh Milk 1L", 60, 120),
  (0x02, "Brown Bread", 45, 80),
  (0x03, "Farm Eggs (12)", 90, 60),
  (0x04, "Basmati Rice 5kg", 540, 40),
  (0x05, "Bananas (6)", 48, 100),
  (0x06, "Greek Yogurt", 75, 0),
];

pub fn demo_products() -> Vec<Product> {
  PRODUCTS
    .iter()
    .map(|&(n, name, price, stock)| Product {
      id: Uuid::from_u128(0x7b1e_5c2a_0000_4000_8000_0000_0000_0000 | n),
      name: name.to_string(),
      image: format!("/images/{}.jpg", name.to_ascii_lowercase().replace(' ', "-")),
      price: Decimal::new(price, 0),
      count_in_stock: stock,
      is_active: true,
      has_image: true,
    })
    .collect()
}

pub fn demo_users() -> Vec<UserProfile> {
  vec![
    UserProfile {
      id: ADMIN_ID,
      name: "Admin User".to_string(),
      email: "admin@example.com".to_string(),
      address: None,
      is_admin: true,
    },
    UserProfile {
      id: CUSTOMER_ID,
      name: "John Doe".to_string(),
      email: "john@example.com".to_string(),
      address: Some("12 Market Road, Hyderabad".to_string()),
      is_admin: false,
    },
  ]
}

pub async fn seed(stores: &Stores) -> GrocerResult<()> {
  let products = demo_products();
  for product in &products {
    stores.products.put(product).await?;
  }
  let users = demo_users();
  for user in &users {
    stores.users.put(user).await?;
  }
  info!(products = products.len(), users = users.len(), "Seeded demo data.");
  Ok(())
}
