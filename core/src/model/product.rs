// grocer/src/model/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog record. The catalog itself is an external collaborator; the
/// engine only reads it and moves `count_in_stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub image: String,
  pub price: Decimal,
  pub count_in_stock: u32,
  pub is_active: bool,
  pub has_image: bool,
}

impl Product {
  /// Derived on every read, never stored.
  pub fn is_purchasable(&self) -> bool {
    self.has_image && self.count_in_stock > 0 && self.is_active
  }

  pub fn view(&self) -> ProductView<'_> {
    ProductView {
      product: self,
      is_purchasable: self.is_purchasable(),
    }
  }
}

/// Serialized form of a product, carrying the derived `isPurchasable` flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView<'a> {
  #[serde(flatten)]
  pub product: &'a Product,
  pub is_purchasable: bool,
}
