// storefront_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use storefront::session::DEFAULT_SESSION_IDLE_TIMEOUT;

pub const DEFAULT_SESSION_COOKIE: &str = "storefront_session";

/// Credentials for the staff account created by `SEED_DB`.
#[derive(Clone)]
pub struct StaffAccount {
  pub username: String,
  pub email: String,
  pub password: String,
}

impl std::fmt::Debug for StaffAccount {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StaffAccount")
      .field("username", &self.username)
      .field("email", &self.email)
      .field("password", &"[REDACTED]")
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Without a database URL the server runs on in-memory stores.
  pub database_url: Option<String>,
  pub session_cookie_name: String,
  pub session_idle_timeout: Duration,
  pub seed_db: bool,
  pub staff_account: Option<StaffAccount>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
      session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
      seed_db: false,
      staff_account: None,
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
    let session_cookie_name =
      get_env("SESSION_COOKIE_NAME").unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string());
    let session_idle_timeout = match get_env("SESSION_IDLE_TIMEOUT_SECS") {
      Ok(raw) => Duration::from_secs(
        raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid SESSION_IDLE_TIMEOUT_SECS: {}", e)))?,
      ),
      Err(_) => DEFAULT_SESSION_IDLE_TIMEOUT,
    };

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    let staff_account = match get_env("STAFF_PASSWORD") {
      Ok(password) if !password.is_empty() => Some(StaffAccount {
        username: get_env("STAFF_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        email: get_env("STAFF_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string()),
        password,
      }),
      _ => None,
    };
    if seed_db && staff_account.is_none() {
      tracing::warn!("SEED_DB is set but STAFF_PASSWORD is not; no staff account will be seeded.");
    }

    tracing::info!(
      in_memory = database_url.is_none(),
      seed_db,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      session_cookie_name,
      session_idle_timeout,
      seed_db,
      staff_account,
    })
  }
}
