// storefront/src/models/mod.rs

//! Data structures for catalog, account and order records.

pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use order::{Order, OrderId, OrderStatus};
pub use order_item::{OrderItem, OrderItemId};
pub use product::{NewProduct, Product, ProductId};
pub use user::{Identity, NewUserRecord, User, UserId};
