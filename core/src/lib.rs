// storefront/src/lib.rs

//! Storefront: the cart/order state machine of a small web shop.
//!
//! A session-scoped `Cart` is mutated by pure operations and converted into a
//! persisted `Order` by the `Checkout` pipeline. Catalog, order, user and
//! session storage sit behind traits (`store`, `session`) so the same rules run
//! against PostgreSQL in the server and against the in-memory stores in tests.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod guard;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod validation;

pub use crate::auth::Accounts;
pub use crate::cart::{Cart, CartLine, CartView};
pub use crate::checkout::{Checkout, CheckoutLocks, CheckoutReceipt};
pub use crate::error::{ShopError, ShopResult, StoreError};
pub use crate::guard::{GuardChain, GuardOutcome, GuardRequest};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::session::{FlashMessage, MemorySessionStore, MessageLevel, Session, SessionStore};
pub use crate::validation::{FieldErrors, Validated};
