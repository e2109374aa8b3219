// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProductId = i64;

/// A catalog entry. `price` is in the smallest currency unit and may change at
/// any time; orders keep their own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub description: String,
  pub price: i64,
  pub created_at: DateTime<Utc>,
}

/// A validated product awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
  pub name: String,
  pub description: String,
  pub price: i64,
}
