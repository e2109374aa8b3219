// storefront/src/store/mod.rs

//! Persistence seams. The core only talks to these traits; the server crate
//! provides PostgreSQL implementations and `memory` provides in-process ones.

pub mod memory;

use crate::error::StoreError;
use crate::models::{NewProduct, NewUserRecord, Order, OrderId, OrderItem, OrderStatus, Product, ProductId, User, UserId};
use async_trait::async_trait;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn list(&self) -> StoreResult<Vec<Product>>;

  async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>>;

  /// One round trip for many ids. Unknown ids are simply absent from the result.
  async fn find_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

  async fn create(&self, product: NewProduct) -> StoreResult<Product>;

  /// Changes the catalog price. Existing order items keep their snapshot.
  async fn update_price(&self, id: ProductId, price: i64) -> StoreResult<Product>;

  async fn remove(&self, id: ProductId) -> StoreResult<()>;
}

/// An open order-writing unit of work.
///
/// Nothing written through it is visible until `commit`. Dropping it without
/// committing discards every write.
#[async_trait]
pub trait OrderTransaction: Send {
  async fn create_order(&mut self, owner: UserId) -> StoreResult<Order>;

  async fn create_order_item(
    &mut self,
    order: &Order,
    product: &Product,
    quantity: u32,
    price: i64,
  ) -> StoreResult<OrderItem>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn begin(&self) -> StoreResult<Box<dyn OrderTransaction>>;

  /// The order with its items.
  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

  /// Newest first.
  async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>>;

  async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
  async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

  async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

  /// Case-insensitive match.
  async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

  /// Fails with `StoreError::Conflict` when the username or email is taken.
  async fn create(&self, user: NewUserRecord) -> StoreResult<User>;

  async fn email_exists(&self, email: &str) -> StoreResult<bool> {
    Ok(self.find_by_email(email).await?.is_some())
  }

  async fn username_exists(&self, username: &str) -> StoreResult<bool> {
    Ok(self.find_by_username(username).await?.is_some())
  }
}
