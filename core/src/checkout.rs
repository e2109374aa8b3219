// storefront/src/checkout.rs

//! Converts a session cart into a persisted order.
//!
//! The conversion is a four-step pipeline:
//! `ensure_cart_not_empty` -> `resolve_cart_products` -> `persist_order` -> `clear_cart`.
//! The order and all of its items are written inside one `OrderTransaction`
//! that lives entirely within `persist_order`; any failure there drops the
//! transaction and leaves the session cart untouched.
//!
//! Checkouts for the same session are serialized through `CheckoutLocks`, and
//! the cart is read only after the lock is held. A second, concurrent checkout
//! therefore sees the already-cleared cart and fails with `ShopError::EmptyCart`.

use crate::cart::Cart;
use crate::error::{ShopError, ShopResult};
use crate::models::{Identity, Order, Product, ProductId};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::session::Session;
use crate::store::{CatalogStore, OrderStore};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};

pub struct CheckoutCtxData {
  pub catalog: Arc<dyn CatalogStore>,
  pub orders: Arc<dyn OrderStore>,
  pub owner: Identity,
  pub cart: Cart,
  /// Resolved products paired with their cart quantity.
  pub lines: Vec<(Product, u32)>,
  /// Cart keys that did not resolve to a product.
  pub stale_entries: Vec<String>,
  pub order: Option<Order>,
}

/// What a successful checkout produced.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
  pub order: Order,
  /// Cart keys dropped because their product no longer exists.
  pub skipped: Vec<String>,
}

impl CheckoutReceipt {
  pub fn total_price(&self) -> i64 {
    self.order.total_price()
  }
}

type LockTable = parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Per-session async mutexes. Entries disappear once no request holds or
/// waits on them.
#[derive(Default, Clone)]
pub struct CheckoutLocks {
  table: Arc<LockTable>,
}

pub struct CheckoutPermit {
  session_id: String,
  guard: Option<OwnedMutexGuard<()>>,
  table: Arc<LockTable>,
}

impl CheckoutLocks {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn acquire(&self, session_id: &str) -> CheckoutPermit {
    let lock = {
      let mut table = self.table.lock();
      table.entry(session_id.to_string()).or_default().clone()
    };
    let guard = lock.lock_owned().await;
    CheckoutPermit {
      session_id: session_id.to_string(),
      guard: Some(guard),
      table: self.table.clone(),
    }
  }

  pub fn tracked_sessions(&self) -> usize {
    self.table.lock().len()
  }
}

impl Drop for CheckoutPermit {
  fn drop(&mut self) {
    drop(self.guard.take());
    let mut table = self.table.lock();
    if table
      .get(&self.session_id)
      .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
      table.remove(&self.session_id);
    }
  }
}

fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData> {
  let mut p = Pipeline::new(
    "checkout",
    &["ensure_cart_not_empty", "resolve_cart_products", "persist_order", "clear_cart"],
  );
  p.on_step("ensure_cart_not_empty", ensure_cart_not_empty);
  p.on_step("resolve_cart_products", resolve_cart_products);
  p.on_step("persist_order", persist_order);
  p.on_step("clear_cart", clear_cart);
  p
}

async fn ensure_cart_not_empty(ctx_data: ContextData<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  if ctx_data.read().cart.is_empty() {
    debug!("Checkout requested with an empty cart.");
    return Err(ShopError::EmptyCart);
  }
  Ok(PipelineControl::Continue)
}

async fn resolve_cart_products(ctx_data: ContextData<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let (catalog, entries, mut stale) = {
    let guard = ctx_data.read();
    let (entries, invalid_keys) = guard.cart.parsed_entries();
    (guard.catalog.clone(), entries, invalid_keys)
  };

  let ids: Vec<ProductId> = entries.iter().map(|(id, _)| *id).collect();
  let products = catalog.find_by_ids(&ids).await?;
  let mut by_id: HashMap<ProductId, Product> = products.into_iter().map(|p| (p.id, p)).collect();

  let mut lines = Vec::with_capacity(entries.len());
  let mut seen = HashSet::with_capacity(entries.len());
  for (id, quantity) in entries {
    if quantity == 0 || !seen.insert(id) {
      continue;
    }
    match by_id.remove(&id) {
      Some(product) => lines.push((product, quantity)),
      None => stale.push(id.to_string()),
    }
  }

  if !stale.is_empty() {
    warn!(stale = ?stale, "Dropping cart entries that no longer match a product.");
  }
  if lines.is_empty() {
    warn!("No cart entry resolved to a product; nothing to order.");
    return Err(ShopError::EmptyCart);
  }

  let mut guard = ctx_data.write();
  guard.lines = lines;
  guard.stale_entries = stale;
  Ok(PipelineControl::Continue)
}

async fn persist_order(ctx_data: ContextData<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let (orders, owner_id, lines) = {
    let guard = ctx_data.read();
    (guard.orders.clone(), guard.owner.user_id, guard.lines.clone())
  };

  let mut tx = orders.begin().await?;
  let mut order = tx.create_order(owner_id).await?;
  for (product, quantity) in &lines {
    let item = tx.create_order_item(&order, product, *quantity, product.price).await?;
    order.items.push(item);
  }
  tx.commit().await?;

  info!(
    order_id = order.id,
    items = order.items.len(),
    total = order.total_price(),
    "Order persisted."
  );
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn clear_cart(ctx_data: ContextData<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let cleared = std::mem::take(&mut guard.cart).clear();
  guard.cart = cleared;
  Ok(PipelineControl::Continue)
}

pub struct Checkout {
  catalog: Arc<dyn CatalogStore>,
  orders: Arc<dyn OrderStore>,
  locks: CheckoutLocks,
  pipeline: Pipeline<CheckoutCtxData>,
}

impl Checkout {
  pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
    Self {
      catalog,
      orders,
      locks: CheckoutLocks::new(),
      pipeline: build_checkout_pipeline(),
    }
  }

  pub fn locks(&self) -> &CheckoutLocks {
    &self.locks
  }

  /// Places an order for `owner` from the session's cart and empties the cart.
  ///
  /// `ShopError::EmptyCart` when there is nothing orderable; the cart is left
  /// as it was. Store failures also leave the cart as it was.
  #[instrument(name = "Checkout::checkout", skip(self, session, owner), fields(user_id = owner.user_id))]
  pub async fn checkout(&self, session: &Session, owner: &Identity) -> ShopResult<CheckoutReceipt> {
    let _permit = self.locks.acquire(session.id()).await;

    let ctx_data = ContextData::new(CheckoutCtxData {
      catalog: self.catalog.clone(),
      orders: self.orders.clone(),
      owner: owner.clone(),
      cart: session.cart(),
      lines: Vec::new(),
      stale_entries: Vec::new(),
      order: None,
    });

    match self.pipeline.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => {
        return Err(ShopError::Internal("checkout pipeline stopped before completion".to_string()));
      }
    }

    let (cart, receipt) = {
      let mut guard = ctx_data.write();
      let order = guard
        .order
        .take()
        .ok_or_else(|| ShopError::Internal("checkout finished without an order".to_string()))?;
      let skipped = std::mem::take(&mut guard.stale_entries);
      (std::mem::take(&mut guard.cart), CheckoutReceipt { order, skipped })
    };
    session.set_cart(&cart)?;
    Ok(receipt)
  }
}
