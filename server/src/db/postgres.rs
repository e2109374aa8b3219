// storefront_server/src/db/postgres.rs

//! PostgreSQL implementations of the storefront store traits (runtime queries,
//! `FromRow` row structs).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use storefront::error::StoreError;
use storefront::models::{
  NewProduct, NewUserRecord, Order, OrderId, OrderItem, OrderStatus, Product, ProductId, User, UserId,
};
use storefront::store::{CatalogStore, OrderStore, OrderTransaction, StoreResult, UserStore};
use tracing::{error, instrument};

fn backend(e: sqlx::Error) -> StoreError {
  error!(error = %e, "Database operation failed.");
  StoreError::Backend { source: e.into() }
}

/// Unique violations become `Conflict`, named after the field they guard.
fn write_error(e: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &e {
    if db_err.is_unique_violation() {
      let field = match db_err.constraint() {
        Some("users_email_lower_key") => "email",
        Some("users_username_key") => "username",
        Some(other) => other,
        None => "record",
      };
      return StoreError::Conflict(format!("{} already exists", field));
    }
  }
  backend(e)
}

fn corrupt(message: String) -> StoreError {
  error!(%message, "Stored row could not be decoded.");
  StoreError::Backend {
    source: anyhow::anyhow!(message),
  }
}

// --- Catalog ---

#[derive(FromRow)]
struct ProductRow {
  id: i64,
  name: String,
  description: String,
  price: i64,
  created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      description: row.description,
      price: row.price,
      created_at: row.created_at,
    }
  }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, created_at";

pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CatalogStore for PgCatalog {
  async fn list(&self) -> StoreResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products ORDER BY id ASC", PRODUCT_COLUMNS))
      .fetch_all(&self.pool)
      .await
      .map_err(backend)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(Product::from))
  }

  #[instrument(name = "PgCatalog::find_by_ids", skip(self), fields(count = ids.len()))]
  async fn find_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows: Vec<ProductRow> =
      sqlx::query_as(&format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  async fn create(&self, product: NewProduct) -> StoreResult<Product> {
    let row: ProductRow = sqlx::query_as(&format!(
      "INSERT INTO products (name, description, price) VALUES ($1, $2, $3) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .fetch_one(&self.pool)
    .await
    .map_err(write_error)?;
    Ok(row.into())
  }

  async fn update_price(&self, id: ProductId, price: i64) -> StoreResult<Product> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
      "UPDATE products SET price = $2 WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(price)
    .fetch_optional(&self.pool)
    .await
    .map_err(write_error)?;
    row
      .map(Product::from)
      .ok_or_else(|| StoreError::NotFound(format!("product {}", id)))
  }

  async fn remove(&self, id: ProductId) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("product {}", id)));
    }
    Ok(())
  }
}

// --- Orders ---

#[derive(FromRow)]
struct OrderRow {
  id: i64,
  user_id: i64,
  status: String,
  created_at: DateTime<Utc>,
}

impl OrderRow {
  fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
    let status = self
      .status
      .parse::<OrderStatus>()
      .map_err(|e| corrupt(format!("order {}: {}", self.id, e)))?;
    Ok(Order {
      id: self.id,
      user_id: self.user_id,
      status,
      created_at: self.created_at,
      items,
    })
  }
}

#[derive(FromRow)]
struct OrderItemRow {
  id: i64,
  order_id: i64,
  product_id: i64,
  quantity: i32,
  price: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
  type Error = StoreError;

  fn try_from(row: OrderItemRow) -> StoreResult<Self> {
    let quantity =
      u32::try_from(row.quantity).map_err(|_| corrupt(format!("order item {}: quantity {}", row.id, row.quantity)))?;
    Ok(OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity,
      price: row.price,
    })
  }
}

const ORDER_COLUMNS: &str = "id, user_id, status, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price";

pub struct PgOrders {
  pool: PgPool,
}

impl PgOrders {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn items_for(&self, order_ids: &[OrderId]) -> StoreResult<HashMap<OrderId, Vec<OrderItem>>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC",
      ORDER_ITEM_COLUMNS
    ))
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      let item = OrderItem::try_from(row)?;
      grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
  }
}

/// Wraps one `sqlx` transaction. Dropping it without `commit` rolls back.
pub struct PgOrderTransaction {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
  async fn create_order(&mut self, owner: UserId) -> StoreResult<Order> {
    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (user_id, status) VALUES ($1, $2) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(owner)
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(&mut *self.tx)
    .await
    .map_err(write_error)?;
    row.into_order(Vec::new())
  }

  async fn create_order_item(
    &mut self,
    order: &Order,
    product: &Product,
    quantity: u32,
    price: i64,
  ) -> StoreResult<OrderItem> {
    let quantity = i32::try_from(quantity).map_err(|_| corrupt(format!("quantity {} out of range", quantity)))?;
    let row: OrderItemRow = sqlx::query_as(&format!(
      "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING {}",
      ORDER_ITEM_COLUMNS
    ))
    .bind(order.id)
    .bind(product.id)
    .bind(quantity)
    .bind(price)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(write_error)?;
    OrderItem::try_from(row)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(backend)
  }
}

#[async_trait]
impl OrderStore for PgOrders {
  async fn begin(&self) -> StoreResult<Box<dyn OrderTransaction>> {
    let tx = self.pool.begin().await.map_err(backend)?;
    Ok(Box::new(PgOrderTransaction { tx }))
  }

  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    let Some(row) = row else {
      return Ok(None);
    };
    let mut items = self.items_for(&[id]).await?;
    row.into_order(items.remove(&id).unwrap_or_default()).map(Some)
  }

  async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY id DESC",
      ORDER_COLUMNS
    ))
    .bind(user)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
    let mut items = self.items_for(&ids).await?;
    rows
      .into_iter()
      .map(|row| {
        let order_items = items.remove(&row.id).unwrap_or_default();
        row.into_order(order_items)
      })
      .collect()
  }

  async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
    let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
      .bind(id)
      .bind(status.as_str())
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("order {}", id)));
    }
    self
      .find_order(id)
      .await?
      .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))
  }
}

// --- Users ---

#[derive(FromRow)]
struct UserRow {
  id: i64,
  username: String,
  email: String,
  password_hash: String,
  is_staff: bool,
  is_active: bool,
  date_joined: DateTime<Utc>,
}

impl From<UserRow> for User {
  fn from(row: UserRow) -> Self {
    User {
      id: row.id,
      username: row.username,
      email: row.email,
      password_hash: row.password_hash,
      is_staff: row.is_staff,
      is_active: row.is_active,
      date_joined: row.date_joined,
    }
  }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, is_staff, is_active, date_joined";

pub struct PgUsers {
  pool: PgPool,
}

impl PgUsers {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn find_one(&self, filter: &str, value: &str) -> StoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, filter))
      .bind(value)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(User::from))
  }
}

#[async_trait]
impl UserStore for PgUsers {
  async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(User::from))
  }

  async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
    self.find_one("username = $1", username).await
  }

  async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
    self.find_one("LOWER(email) = LOWER($1)", email).await
  }

  #[instrument(name = "PgUsers::create", skip(self, user), fields(username = %user.username))]
  async fn create(&self, user: NewUserRecord) -> StoreResult<User> {
    let row: UserRow = sqlx::query_as(&format!(
      "INSERT INTO users (username, email, password_hash, is_staff) VALUES ($1, $2, $3, $4) RETURNING {}",
      USER_COLUMNS
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .fetch_one(&self.pool)
    .await
    .map_err(write_error)?;
    Ok(row.into())
  }
}
