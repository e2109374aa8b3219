// tests/auth_tests.rs
mod common;

use common::*;
use storefront::auth::{hash_password, verify_password};
use storefront::store::UserStore;
use storefront::validation::RegisterForm;
use std::time::Instant;
use storefront::models::NewUserRecord;
use storefront::{ShopError, StoreError};

fn form(username: &str, email: &str, password: &str) -> RegisterForm {
  RegisterForm {
    username: username.to_string(),
    email: email.to_string(),
    password1: password.to_string(),
    password2: password.to_string(),
  }
}

#[test]
fn test_hash_and_verify() {
  let hash = hash_password("correct horse").unwrap();
  assert!(hash.starts_with("$argon2"));
  assert!(verify_password(&hash, "correct horse").unwrap());
  assert!(!verify_password(&hash, "wrong horse").unwrap());
  assert!(verify_password("not-a-phc-string", "x").is_err());
}

#[tokio::test]
async fn test_register_creates_regular_account() {
  setup_tracing();
  let shop = TestShop::new();

  let user = shop.accounts.register(form("alice", "alice@example.com", "s3cure-pass")).await.unwrap();

  assert_eq!(user.username, "alice");
  assert!(!user.is_staff);
  assert!(user.is_active);
  assert_ne!(user.password_hash, "s3cure-pass");
  assert!(shop.users.find_by_username("alice").await.unwrap().is_some());
}

#[tokio::test]
async fn test_register_with_existing_email_reports_field_error() {
  setup_tracing();
  let shop = TestShop::new();
  shop.accounts.register(form("alice", "alice@example.com", "s3cure-pass")).await.unwrap();

  let result = shop.accounts.register(form("alicia", "ALICE@example.com", "s3cure-pass")).await;

  match result {
    Err(ShopError::Validation(errors)) => {
      assert!(errors.has("email"));
      assert!(!errors.has("username"));
    }
    other => panic!("expected a validation error, got {:?}", other),
  }
  assert_eq!(shop.users.count(), 1);
}

#[tokio::test]
async fn test_register_with_bad_fields_writes_nothing() {
  setup_tracing();
  let shop = TestShop::new();
  let mut bad = form("bob", "bob@example.com", "abc12345");
  bad.password2 = "different1".to_string();

  let result = shop.accounts.register(bad).await;

  assert!(matches!(result, Err(ShopError::Validation(ref e)) if e.has("password2")));
  assert_eq!(shop.users.count(), 0);
}

#[tokio::test]
async fn test_authenticate_by_email_or_username() {
  setup_tracing();
  let shop = TestShop::new();
  let created = shop.accounts.register(form("carol", "carol@example.com", "pa55word!")).await.unwrap();

  let by_email = shop.accounts.authenticate("Carol@Example.com", "pa55word!").await.unwrap();
  let by_name = shop.accounts.authenticate("carol", "pa55word!").await.unwrap();

  assert_eq!(by_email.id, created.id);
  assert_eq!(by_name.id, created.id);
}

#[tokio::test]
async fn test_authentication_failures_are_indistinguishable() {
  setup_tracing();
  let shop = TestShop::new();
  let user = shop.accounts.register(form("dave", "dave@example.com", "pa55word!")).await.unwrap();

  let unknown = shop.accounts.authenticate("nobody", "pa55word!").await;
  let wrong = shop.accounts.authenticate("dave", "nope-nope").await;
  shop.users.set_active(user.id, false);
  let inactive = shop.accounts.authenticate("dave", "pa55word!").await;

  for result in [unknown, wrong, inactive] {
    assert!(matches!(result, Err(ShopError::Authentication)));
  }
}

#[tokio::test]
async fn test_ensure_staff_is_idempotent() {
  setup_tracing();
  let shop = TestShop::new();

  let first = shop.accounts.ensure_staff("admin", "admin@example.com", "adm1n-pass").await.unwrap();
  let second = shop.accounts.ensure_staff("admin", "admin@example.com", "adm1n-pass").await.unwrap();

  assert!(first.is_staff);
  assert_eq!(first.id, second.id);
  assert_eq!(shop.users.count(), 1);
}

#[tokio::test]
async fn test_ensure_staff_refuses_a_regular_account() {
  setup_tracing();
  let shop = TestShop::new();
  shop
    .users
    .create(NewUserRecord {
      username: "admin".to_string(),
      email: "someone@example.com".to_string(),
      password_hash: hash_password("pa55word!").unwrap(),
      is_staff: false,
    })
    .await
    .unwrap();

  let result = shop.accounts.ensure_staff("admin", "admin@example.com", "adm1n-pass").await;

  assert!(matches!(result, Err(ShopError::Store(StoreError::Conflict(_)))));
  assert_eq!(shop.users.count(), 1);
}

#[tokio::test]
async fn test_unknown_identifier_costs_a_password_check() {
  setup_tracing();
  let shop = TestShop::new();
  shop.accounts.register(form("frank", "frank@example.com", "pa55word!")).await.unwrap();
  // First use builds the placeholder hash.
  let _ = shop.accounts.authenticate("nobody", "warm-up").await;

  let started = Instant::now();
  let known = shop.accounts.authenticate("frank", "wrong-pass").await;
  let known_elapsed = started.elapsed();

  let started = Instant::now();
  let unknown = shop.accounts.authenticate("nobody", "wrong-pass").await;
  let unknown_elapsed = started.elapsed();

  assert!(matches!(known, Err(ShopError::Authentication)));
  assert!(matches!(unknown, Err(ShopError::Authentication)));
  assert!(
    unknown_elapsed * 4 >= known_elapsed,
    "unknown: {:?}, known: {:?}",
    unknown_elapsed,
    known_elapsed
  );
}
