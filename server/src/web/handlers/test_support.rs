// storefront_server/src/web/handlers/test_support.rs

//! Shared fixtures for the handler tests.

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use std::sync::Arc;
use storefront::auth::hash_password;
use storefront::models::{NewProduct, NewUserRecord, Product, User};
use storefront::Session;
use uuid::Uuid;

use crate::config::{AppConfig, DEFAULT_SESSION_COOKIE};
use crate::state::AppState;

pub use crate::web::build_app as app;
pub use storefront::store::{CatalogStore, OrderStore, UserStore};

pub const TEST_PASSWORD: &str = "pa55word!";

pub fn memory_state() -> AppState {
  AppState::in_memory(Arc::new(AppConfig::default()))
}

pub async fn stock(state: &AppState, name: &str, price: i64) -> Product {
  state
    .catalog
    .create(NewProduct {
      name: name.to_string(),
      description: format!("{} description", name),
      price,
    })
    .await
    .expect("fixture product")
}

pub async fn member(state: &AppState, username: &str, is_staff: bool) -> User {
  state
    .users
    .create(NewUserRecord {
      username: username.to_string(),
      email: format!("{}@example.com", username),
      password_hash: hash_password(TEST_PASSWORD).expect("hash"),
      is_staff,
    })
    .await
    .expect("fixture user")
}

/// A fresh session id with its cookie, already known to the session store.
pub fn anonymous_session(state: &AppState) -> (Cookie<'static>, Session) {
  let id = Uuid::new_v4().to_string();
  let session = Session::new(id.clone(), state.sessions.clone());
  (Cookie::new(DEFAULT_SESSION_COOKIE, id), session)
}

pub fn logged_in_session(state: &AppState, user: &User) -> (Cookie<'static>, Session) {
  let (_, mut session) = anonymous_session(state);
  session.login(user, Uuid::new_v4().to_string());
  let cookie = Cookie::new(DEFAULT_SESSION_COOKIE, session.id().to_string());
  (cookie, session)
}

pub fn logged_in_cookie(state: &AppState, user: &User) -> Cookie<'static> {
  logged_in_session(state, user).0
}

pub fn location<B>(res: &ServiceResponse<B>) -> String {
  res
    .headers()
    .get(header::LOCATION)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string()
}
