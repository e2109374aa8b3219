// storefront/src/auth.rs

//! Password hashing, account registration and credential checks.

use crate::error::{ShopError, ShopResult, StoreError};
use crate::models::{NewUserRecord, User};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::store::UserStore;
use crate::validation::{validate_registration, FieldErrors, RegisterForm, ValidRegistration, Validated};
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, error, event, info, instrument, warn, Level};

#[instrument(name = "auth::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> ShopResult<String> {
  if password.is_empty() {
    let mut errors = FieldErrors::new();
    errors.add("password1", "This field is required.");
    return Err(ShopError::Validation(errors));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      ShopError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(
  name = "auth::verify_password",
  skip(stored_hash, provided_password),
  fields(hash_len = stored_hash.len()),
  err(Display)
)]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> ShopResult<bool> {
  if provided_password.is_empty() {
    return Ok(false);
  }
  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    ShopError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(other) => {
      error!(error = %other, "Argon2 password verification process encountered an error.");
      Err(ShopError::Internal(format!("Password verification process failed: {}", other)))
    }
  }
}

/// Hash checked when no account matches, so unknown identifiers cost the same
/// argon2 work as a wrong password.
static UNKNOWN_ACCOUNT_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("unknown-account-placeholder").ok());

fn verify_against_placeholder(password: &str) {
  if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
    // The outcome is irrelevant.
    let _ = verify_password(hash, password);
  }
}

pub struct RegistrationCtxData {
  pub users: Arc<dyn UserStore>,
  pub form: RegisterForm,
  pub valid: Option<ValidRegistration>,
  pub created_user: Option<User>,
}

fn build_registration_pipeline() -> Pipeline<RegistrationCtxData> {
  let mut p = Pipeline::new(
    "registration",
    &["validate_registration_input", "check_existing_account", "create_account"],
  );
  p.on_step("validate_registration_input", validate_registration_input);
  p.on_step("check_existing_account", check_existing_account);
  p.on_step("create_account", create_account);
  p
}

async fn validate_registration_input(ctx_data: ContextData<RegistrationCtxData>) -> ShopResult<PipelineControl> {
  let outcome = {
    let guard = ctx_data.read();
    validate_registration(&guard.form)
  };
  match outcome {
    Validated::Valid(valid) => {
      ctx_data.write().valid = Some(valid);
      Ok(PipelineControl::Continue)
    }
    Validated::Invalid(errors) => {
      debug!(fields = %errors, "Registration input rejected.");
      Err(ShopError::Validation(errors))
    }
  }
}

fn validated_input(ctx_data: &ContextData<RegistrationCtxData>) -> ShopResult<(Arc<dyn UserStore>, ValidRegistration)> {
  let guard = ctx_data.read();
  let valid = guard
    .valid
    .clone()
    .ok_or_else(|| ShopError::Internal("registration input was not validated".to_string()))?;
  Ok((guard.users.clone(), valid))
}

async fn check_existing_account(ctx_data: ContextData<RegistrationCtxData>) -> ShopResult<PipelineControl> {
  let (users, valid) = validated_input(&ctx_data)?;

  let mut errors = FieldErrors::new();
  if users.username_exists(&valid.username).await? {
    errors.add("username", "A user with that username already exists.");
  }
  if users.email_exists(&valid.email).await? {
    errors.add("email", "This email address is already in use.");
  }
  if errors.is_empty() {
    Ok(PipelineControl::Continue)
  } else {
    warn!(username = %valid.username, "Registration attempted with an existing username or email.");
    Err(ShopError::Validation(errors))
  }
}

async fn create_account(ctx_data: ContextData<RegistrationCtxData>) -> ShopResult<PipelineControl> {
  let (users, valid) = validated_input(&ctx_data)?;

  let password_hash = hash_password(&valid.password)?;
  let record = NewUserRecord {
    username: valid.username,
    email: valid.email,
    password_hash,
    is_staff: false,
  };
  match users.create(record).await {
    Ok(user) => {
      info!(user_id = user.id, username = %user.username, "Account created.");
      ctx_data.write().created_user = Some(user);
      Ok(PipelineControl::Continue)
    }
    // Lost a race with a concurrent registration for the same name or email.
    Err(StoreError::Conflict(what)) => {
      let mut errors = FieldErrors::new();
      let field = if what.starts_with("email") { "email" } else { "username" };
      errors.add(field, "This value is already in use.");
      Err(ShopError::Validation(errors))
    }
    Err(other) => Err(other.into()),
  }
}

/// Account operations over a `UserStore`.
pub struct Accounts {
  users: Arc<dyn UserStore>,
  registration: Pipeline<RegistrationCtxData>,
}

impl Accounts {
  pub fn new(users: Arc<dyn UserStore>) -> Self {
    Self {
      users,
      registration: build_registration_pipeline(),
    }
  }

  /// Creates a regular account. Field problems and taken names or emails come
  /// back as `ShopError::Validation` and nothing is written.
  #[instrument(name = "Accounts::register", skip(self, form), fields(username = %form.username))]
  pub async fn register(&self, form: RegisterForm) -> ShopResult<User> {
    let ctx_data = ContextData::new(RegistrationCtxData {
      users: self.users.clone(),
      form,
      valid: None,
      created_user: None,
    });

    match self.registration.run(ctx_data.clone()).await? {
      PipelineResult::Completed => ctx_data
        .write()
        .created_user
        .take()
        .ok_or_else(|| ShopError::Internal("registration finished without a user".to_string())),
      PipelineResult::Stopped => Err(ShopError::Internal("registration pipeline stopped early".to_string())),
    }
  }

  /// Checks credentials. `identifier` is tried as an email first, then as a
  /// username. Every failure is the same `ShopError::Authentication`.
  #[instrument(name = "Accounts::authenticate", skip(self, password))]
  pub async fn authenticate(&self, identifier: &str, password: &str) -> ShopResult<User> {
    let user = match self.users.find_by_email(identifier).await? {
      Some(user) => Some(user),
      None => self.users.find_by_username(identifier).await?,
    };
    let Some(user) = user else {
      verify_against_placeholder(password);
      event!(Level::INFO, "Login failed: no matching account.");
      return Err(ShopError::Authentication);
    };
    if !verify_password(&user.password_hash, password)? {
      event!(Level::INFO, user_id = user.id, "Login failed: password mismatch.");
      return Err(ShopError::Authentication);
    }
    if !user.is_active {
      event!(Level::INFO, user_id = user.id, "Login failed: account inactive.");
      return Err(ShopError::Authentication);
    }
    info!(user_id = user.id, "User authenticated.");
    Ok(user)
  }

  /// Returns the existing staff account named `username`, or creates it.
  /// A non-staff account already holding the name is a `StoreError::Conflict`.
  #[instrument(name = "Accounts::ensure_staff", skip(self, password))]
  pub async fn ensure_staff(&self, username: &str, email: &str, password: &str) -> ShopResult<User> {
    if let Some(existing) = self.users.find_by_username(username).await? {
      if !existing.is_staff {
        warn!(user_id = existing.id, "Staff username is taken by a regular account.");
        return Err(StoreError::Conflict(format!("username '{}' belongs to a non-staff account", username)).into());
      }
      return Ok(existing);
    }
    let user = self
      .users
      .create(NewUserRecord {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
        is_staff: true,
      })
      .await?;
    info!(user_id = user.id, "Staff account created.");
    Ok(user)
  }
}
