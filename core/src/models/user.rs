// storefront/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: UserId,
  pub username: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send the password hash to a client
  pub password_hash: String,
  pub is_staff: bool,
  pub is_active: bool,
  pub date_joined: DateTime<Utc>,
}

/// Row data for `UserStore::create`; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
  pub username: String,
  pub email: String,
  pub password_hash: String,
  pub is_staff: bool,
}

/// The logged-in identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
  pub user_id: UserId,
  pub username: String,
  pub is_staff: bool,
}

impl From<&User> for Identity {
  fn from(user: &User) -> Self {
    Identity {
      user_id: user.id,
      username: user.username.clone(),
      is_staff: user.is_staff,
    }
  }
}
