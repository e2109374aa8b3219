// storefront/src/cart.rs

//! The session cart: product id -> quantity.
//!
//! A `Cart` is a plain value. Operations consume it and hand back the updated
//! cart; the request layer decides when to write it back into the session.
//! Quantities are always at least 1; an entry that would drop to 0 is removed.

use crate::error::ShopResult;
use crate::models::{Product, ProductId};
use crate::store::CatalogStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Keys are the decimal product id, matching the `{"7": 3}` session layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(BTreeMap<String, u32>);

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds one unit of `product_id`. Repeated calls keep incrementing.
  pub fn add(mut self, product_id: ProductId) -> Self {
    let quantity = self.0.entry(product_id.to_string()).or_insert(0);
    *quantity = quantity.saturating_add(1);
    self
  }

  /// Drops the entry for `product_id`; a missing entry is a no-op.
  pub fn remove(mut self, product_id: ProductId) -> Self {
    self.0.remove(&product_id.to_string());
    self
  }

  /// Sets an exact quantity. Zero removes the entry.
  pub fn set_quantity(mut self, product_id: ProductId, quantity: u32) -> Self {
    if quantity == 0 {
      self.0.remove(&product_id.to_string());
    } else {
      self.0.insert(product_id.to_string(), quantity);
    }
    self
  }

  pub fn clear(self) -> Self {
    Self::default()
  }

  pub fn contains(&self, product_id: ProductId) -> bool {
    self.0.contains_key(&product_id.to_string())
  }

  pub fn quantity(&self, product_id: ProductId) -> u32 {
    self.0.get(&product_id.to_string()).copied().unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Raw `(key, quantity)` pairs, including keys that are not valid ids.
  pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
    self.0.iter().map(|(k, q)| (k.as_str(), *q))
  }

  /// Splits the entries into parseable `(id, quantity)` pairs and the raw keys
  /// that are not product ids.
  pub fn parsed_entries(&self) -> (Vec<(ProductId, u32)>, Vec<String>) {
    let mut valid = Vec::with_capacity(self.0.len());
    let mut invalid = Vec::new();
    for (key, quantity) in &self.0 {
      match key.parse::<ProductId>() {
        Ok(id) => valid.push((id, *quantity)),
        Err(_) => invalid.push(key.clone()),
      }
    }
    (valid, invalid)
  }

  pub fn product_ids(&self) -> Vec<ProductId> {
    self.parsed_entries().0.into_iter().map(|(id, _)| id).collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
  pub product: Product,
  pub quantity: u32,
  /// Current catalog price times quantity.
  pub total_price: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLine>,
  pub total_price: i64,
}

/// Builds the cart page from already-fetched products. Entries whose product
/// is not in `products` are left out.
pub fn build_view(cart: &Cart, products: &[Product]) -> CartView {
  let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
  let (entries, _) = cart.parsed_entries();

  let lines: Vec<CartLine> = entries
    .into_iter()
    .filter_map(|(id, quantity)| {
      by_id.get(&id).map(|product| CartLine {
        product: (*product).clone(),
        quantity,
        total_price: product.price.saturating_mul(i64::from(quantity)),
      })
    })
    .collect();
  let total_price = lines.iter().map(|l| l.total_price).fold(0i64, i64::saturating_add);

  CartView { lines, total_price }
}

/// Resolves the cart against the catalog with current prices.
#[instrument(name = "cart::view", skip(catalog, cart), fields(entries = cart.len()))]
pub async fn view_cart(catalog: &dyn CatalogStore, cart: &Cart) -> ShopResult<CartView> {
  let ids = cart.product_ids();
  if ids.is_empty() {
    return Ok(CartView::default());
  }
  let products = catalog.find_by_ids(&ids).await?;
  let view = build_view(cart, &products);
  if view.lines.len() != cart.len() {
    debug!(
      resolved = view.lines.len(),
      entries = cart.len(),
      "Some cart entries no longer match a product."
    );
  }
  Ok(view)
}
