// storefront_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::{ShopError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error(transparent)]
  Shop(ShopError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<ShopError> for AppError {
  fn from(err: ShopError) -> Self {
    match err {
      ShopError::NotFound(what) => AppError::NotFound(what),
      other => AppError::Shop(other),
    }
  }
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    AppError::Shop(ShopError::Store(err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Shop(ShopError::Validation(_)) => StatusCode::BAD_REQUEST,
      AppError::Shop(ShopError::Authentication) => StatusCode::UNAUTHORIZED,
      AppError::Shop(ShopError::EmptyCart) => StatusCode::CONFLICT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    match self {
      AppError::NotFound(m) => {
        tracing::info!(resource = %m, "Responding with not found");
        HttpResponse::NotFound().json(json!({"page": "not_found", "error": "Not found", "detail": m}))
      }
      AppError::BadRequest(m) => {
        tracing::info!(detail = %m, "Rejecting malformed request");
        HttpResponse::BadRequest().json(json!({"error": "Bad request", "detail": m}))
      }
      AppError::Shop(ShopError::Validation(errors)) => {
        HttpResponse::build(status).json(json!({"error": "Invalid input", "errors": errors}))
      }
      AppError::Shop(ShopError::Authentication) => {
        HttpResponse::build(status).json(json!({"error": "Authentication failed"}))
      }
      AppError::Shop(ShopError::EmptyCart) => HttpResponse::build(status).json(json!({"error": "Cart is empty"})),
      _ => {
        // Full detail stays in the logs.
        tracing::error!(application_error = %self, "Responding with error");
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred"}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
