// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use std::sync::Arc;
use storefront::error::{ShopError, StoreError};
use storefront::models::{Identity, NewUserRecord, Order, OrderId, OrderItem, OrderStatus, Product, ProductId, UserId};
use storefront::pipeline::{ContextData, Handler, PipelineControl};
use storefront::store::memory::{MemoryCatalog, MemoryOrders, MemoryUsers};
use storefront::store::{OrderStore, OrderTransaction, StoreResult, UserStore};
use storefront::{Accounts, Checkout, MemorySessionStore, Session, SessionStore};
use tracing::Level;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Pipeline fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

pub fn create_simple_handler(step_name: &'static str, message_to_append: &'static str) -> Handler<TestContext> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok::<_, ShopError>(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(step_name: &'static str, error_message: &'static str) -> Handler<TestContext> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err::<PipelineControl, _>(ShopError::Internal(error_message.to_string()))
    })
  })
}

// --- Shop fixtures ---
pub fn product(id: ProductId, name: &str, price: i64) -> Product {
  Product {
    id,
    name: name.to_string(),
    description: format!("{} description", name),
    price,
    created_at: Utc::now(),
  }
}

/// Every store wired up in memory, sharing state with the services built on top.
pub struct TestShop {
  pub catalog: Arc<MemoryCatalog>,
  pub orders: Arc<MemoryOrders>,
  pub users: Arc<MemoryUsers>,
  pub sessions: Arc<MemorySessionStore>,
  pub checkout: Checkout,
  pub accounts: Accounts,
}

impl TestShop {
  pub fn new() -> Self {
    let orders = Arc::new(MemoryOrders::new());
    Self::with_orders(orders.clone(), orders)
  }

  /// Checkout writes through `order_store`; `orders` is still the inspectable one.
  pub fn with_orders(orders: Arc<MemoryOrders>, order_store: Arc<dyn OrderStore>) -> Self {
    let catalog = Arc::new(MemoryCatalog::new());
    let users = Arc::new(MemoryUsers::new());
    Self {
      checkout: Checkout::new(catalog.clone(), order_store),
      accounts: Accounts::new(users.clone()),
      catalog,
      orders,
      users,
      sessions: Arc::new(MemorySessionStore::new()),
    }
  }

  pub fn stock(&self, products: &[Product]) {
    for p in products {
      self.catalog.insert(p.clone());
    }
  }

  pub fn session(&self, id: &str) -> Session {
    let store: Arc<dyn SessionStore> = self.sessions.clone();
    Session::new(id, store)
  }

  pub async fn member(&self, username: &str) -> Identity {
    let user = self
      .users
      .create(NewUserRecord {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "unused".to_string(),
        is_staff: false,
      })
      .await
      .expect("fixture user");
    Identity::from(&user)
  }
}

// --- An order store whose writes fail part-way through ---
pub struct FailingOrders {
  pub inner: Arc<MemoryOrders>,
  /// Item writes succeed this many times, then fail.
  pub items_before_failure: usize,
}

struct FailingTransaction {
  inner: Box<dyn OrderTransaction>,
  remaining: usize,
}

#[async_trait]
impl OrderTransaction for FailingTransaction {
  async fn create_order(&mut self, owner: UserId) -> StoreResult<Order> {
    self.inner.create_order(owner).await
  }

  async fn create_order_item(
    &mut self,
    order: &Order,
    product: &Product,
    quantity: u32,
    price: i64,
  ) -> StoreResult<OrderItem> {
    if self.remaining == 0 {
      return Err(StoreError::Backend {
        source: anyhow::anyhow!("simulated write failure"),
      });
    }
    self.remaining -= 1;
    self.inner.create_order_item(order, product, quantity, price).await
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.inner.commit().await
  }
}

#[async_trait]
impl OrderStore for FailingOrders {
  async fn begin(&self) -> StoreResult<Box<dyn OrderTransaction>> {
    Ok(Box::new(FailingTransaction {
      inner: self.inner.begin().await?,
      remaining: self.items_before_failure,
    }))
  }

  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
    self.inner.find_order(id).await
  }

  async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
    self.inner.orders_for_user(user).await
  }

  async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
    self.inner.set_status(id, status).await
  }
}
