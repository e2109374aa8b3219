// storefront_server/src/state.rs
use crate::config::AppConfig;
use crate::db::postgres::{PgCatalog, PgOrders, PgUsers};
use sqlx::PgPool;
use std::sync::Arc;
use storefront::store::memory::{MemoryCatalog, MemoryOrders, MemoryUsers};
use storefront::store::{CatalogStore, OrderStore, UserStore};
use storefront::{Accounts, Checkout, MemorySessionStore, SessionStore};

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<dyn CatalogStore>,
  pub orders: Arc<dyn OrderStore>,
  pub users: Arc<dyn UserStore>,
  pub sessions: Arc<dyn SessionStore>,
  pub accounts: Arc<Accounts>,
  pub checkout: Arc<Checkout>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    config: Arc<AppConfig>,
  ) -> Self {
    Self {
      accounts: Arc::new(Accounts::new(users.clone())),
      checkout: Arc::new(Checkout::new(catalog.clone(), orders.clone())),
      catalog,
      orders,
      users,
      sessions,
      config,
    }
  }

  pub fn in_memory(config: Arc<AppConfig>) -> Self {
    Self::new(
      Arc::new(MemoryCatalog::new()),
      Arc::new(MemoryOrders::new()),
      Arc::new(MemoryUsers::new()),
      Arc::new(MemorySessionStore::with_idle_timeout(config.session_idle_timeout)),
      config,
    )
  }

  /// PostgreSQL for catalog, orders and accounts. Sessions stay in process.
  pub fn postgres(pool: PgPool, config: Arc<AppConfig>) -> Self {
    Self::new(
      Arc::new(PgCatalog::new(pool.clone())),
      Arc::new(PgOrders::new(pool.clone())),
      Arc::new(PgUsers::new(pool)),
      Arc::new(MemorySessionStore::with_idle_timeout(config.session_idle_timeout)),
      config,
    )
  }
}
