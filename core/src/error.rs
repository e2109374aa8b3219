// storefront/src/error.rs
use crate::validation::FieldErrors;
use thiserror::Error;

/// Failures reported by catalog, order, user and session backends.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Record not found: {0}")]
  NotFound(String),

  /// A uniqueness constraint rejected the write (e.g. duplicate email).
  #[error("Conflicting record: {0}")]
  Conflict(String),

  #[error("Storage backend failure: {source}")]
  Backend {
    #[from]
    source: anyhow::Error,
  },
}

/// Everything a storefront operation can fail with.
///
/// Validation, authentication, not-found and empty-cart failures are expected
/// outcomes that the request layer turns into re-rendered forms, redirects or
/// a "not found" page. `Store`, `HandlerMissing` and `Internal` are faults.
#[derive(Debug, Error)]
pub enum ShopError {
  #[error("Validation Error: {0}")]
  Validation(FieldErrors),

  /// Carries no detail about which credential was wrong.
  #[error("Authentication Failed")]
  Authentication,

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Cart is empty")]
  EmptyCart,

  #[error("Storage Error: {0}")]
  Store(#[from] StoreError),

  #[error("Handler missing for pipeline step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Internal Error: {0}")]
  Internal(String),
}

pub type ShopResult<T, E = ShopError> = std::result::Result<T, E>;
