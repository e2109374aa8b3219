// storefront/src/store/memory.rs

//! In-process stores backed by `parking_lot` locks. Used by the test suites
//! and when the server runs without `DATABASE_URL`.

use crate::error::StoreError;
use crate::models::{
  NewProduct, NewUserRecord, Order, OrderId, OrderItem, OrderStatus, Product, ProductId, User, UserId,
};
use crate::store::{CatalogStore, OrderStore, OrderTransaction, StoreResult, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Sequence(Mutex<i64>);

impl Sequence {
  fn next(&self) -> i64 {
    let mut current = self.0.lock();
    *current += 1;
    *current
  }
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
  products: RwLock<BTreeMap<ProductId, Product>>,
  ids: Sequence,
}

impl MemoryCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts a product with a caller-chosen id, replacing any existing one.
  pub fn insert(&self, product: Product) {
    let mut ids = self.ids.0.lock();
    if product.id > *ids {
      *ids = product.id;
    }
    self.products.write().insert(product.id, product);
  }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
  async fn list(&self) -> StoreResult<Vec<Product>> {
    Ok(self.products.read().values().cloned().collect())
  }

  async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
    Ok(self.products.read().get(&id).cloned())
  }

  async fn find_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
    let products = self.products.read();
    Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
  }

  async fn create(&self, product: NewProduct) -> StoreResult<Product> {
    let product = Product {
      id: self.ids.next(),
      name: product.name,
      description: product.description,
      price: product.price,
      created_at: Utc::now(),
    };
    self.products.write().insert(product.id, product.clone());
    Ok(product)
  }

  async fn update_price(&self, id: ProductId, price: i64) -> StoreResult<Product> {
    let mut products = self.products.write();
    let product = products
      .get_mut(&id)
      .ok_or_else(|| StoreError::NotFound(format!("product {}", id)))?;
    product.price = price;
    Ok(product.clone())
  }

  async fn remove(&self, id: ProductId) -> StoreResult<()> {
    self
      .products
      .write()
      .remove(&id)
      .map(|_| ())
      .ok_or_else(|| StoreError::NotFound(format!("product {}", id)))
  }
}

#[derive(Debug, Default)]
struct OrderTables {
  orders: BTreeMap<OrderId, Order>,
}

/// Orders are stored with their items embedded.
#[derive(Debug, Default, Clone)]
pub struct MemoryOrders {
  tables: Arc<RwLock<OrderTables>>,
  order_ids: Arc<Sequence>,
  item_ids: Arc<Sequence>,
}

impl MemoryOrders {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn order_count(&self) -> usize {
    self.tables.read().orders.len()
  }
}

/// Writes are staged locally and only published to the shared tables on commit.
pub struct MemoryOrderTransaction {
  store: MemoryOrders,
  staged: Vec<Order>,
}

#[async_trait]
impl OrderTransaction for MemoryOrderTransaction {
  async fn create_order(&mut self, owner: UserId) -> StoreResult<Order> {
    let order = Order {
      id: self.store.order_ids.next(),
      user_id: owner,
      status: OrderStatus::Pending,
      created_at: Utc::now(),
      items: Vec::new(),
    };
    self.staged.push(order.clone());
    Ok(order)
  }

  async fn create_order_item(
    &mut self,
    order: &Order,
    product: &Product,
    quantity: u32,
    price: i64,
  ) -> StoreResult<OrderItem> {
    let staged = self
      .staged
      .iter_mut()
      .find(|o| o.id == order.id)
      .ok_or_else(|| StoreError::NotFound(format!("order {} in this transaction", order.id)))?;
    let item = OrderItem {
      id: self.store.item_ids.next(),
      order_id: order.id,
      product_id: product.id,
      quantity,
      price,
    };
    staged.items.push(item.clone());
    Ok(item)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryOrderTransaction { store, staged } = *self;
    debug!(orders = staged.len(), "Committing staged orders.");
    let mut tables = store.tables.write();
    for order in staged {
      tables.orders.insert(order.id, order);
    }
    Ok(())
  }
}

#[async_trait]
impl OrderStore for MemoryOrders {
  async fn begin(&self) -> StoreResult<Box<dyn OrderTransaction>> {
    Ok(Box::new(MemoryOrderTransaction {
      store: self.clone(),
      staged: Vec::new(),
    }))
  }

  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
    Ok(self.tables.read().orders.get(&id).cloned())
  }

  async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
    Ok(
      self
        .tables
        .read()
        .orders
        .values()
        .rev()
        .filter(|o| o.user_id == user)
        .cloned()
        .collect(),
    )
  }

  async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
    let mut tables = self.tables.write();
    let order = tables
      .orders
      .get_mut(&id)
      .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;
    order.status = status;
    Ok(order.clone())
  }
}

#[derive(Debug, Default)]
pub struct MemoryUsers {
  users: RwLock<BTreeMap<UserId, User>>,
  ids: Sequence,
}

impl MemoryUsers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn count(&self) -> usize {
    self.users.read().len()
  }

  /// Flips `is_active`; returns false when the user does not exist.
  pub fn set_active(&self, id: UserId, active: bool) -> bool {
    match self.users.write().get_mut(&id) {
      Some(user) => {
        user.is_active = active;
        true
      }
      None => false,
    }
  }
}

#[async_trait]
impl UserStore for MemoryUsers {
  async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
    Ok(self.users.read().get(&id).cloned())
  }

  async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
    Ok(self.users.read().values().find(|u| u.username == username).cloned())
  }

  async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
    Ok(
      self
        .users
        .read()
        .values()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .cloned(),
    )
  }

  async fn create(&self, new_user: NewUserRecord) -> StoreResult<User> {
    let mut users = self.users.write();
    if users.values().any(|u| u.username == new_user.username) {
      return Err(StoreError::Conflict(format!("username '{}'", new_user.username)));
    }
    if users.values().any(|u| u.email.eq_ignore_ascii_case(&new_user.email)) {
      return Err(StoreError::Conflict(format!("email '{}'", new_user.email)));
    }
    let user = User {
      id: self.ids.next(),
      username: new_user.username,
      email: new_user.email,
      password_hash: new_user.password_hash,
      is_staff: new_user.is_staff,
      is_active: true,
      date_joined: Utc::now(),
    };
    users.insert(user.id, user.clone());
    Ok(user)
  }
}
