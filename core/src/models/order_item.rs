// storefront/src/models/order_item.rs

use crate::models::order::OrderId;
use crate::models::product::ProductId;
use serde::{Deserialize, Serialize};

pub type OrderItemId = i64;

/// One line of an order.
///
/// `product_id` is a weak reference: the product may later be repriced or
/// removed. `price` is the snapshot taken at checkout and is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: OrderItemId,
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: u32,
  pub price: i64,
}

impl OrderItem {
  pub fn total_price(&self) -> i64 {
    self.price.saturating_mul(i64::from(self.quantity))
  }
}
