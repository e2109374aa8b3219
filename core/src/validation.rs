// storefront/src/validation.rs

//! Form payloads and their validators.
//!
//! Validators never fail with an error; they return `Validated::Invalid` with
//! every problem found, keyed by field name, so a form can be re-rendered with
//! all messages at once.

use crate::models::NewProduct;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Field name -> messages. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn has(&self, field: &str) -> bool {
    self.0.contains_key(field)
  }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{}: {}", field, message)?;
        first = false;
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated<T> {
  Valid(T),
  Invalid(FieldErrors),
}

impl<T> Validated<T> {
  fn from_errors(errors: FieldErrors, value: impl FnOnce() -> T) -> Self {
    if errors.is_empty() {
      Validated::Valid(value())
    } else {
      Validated::Invalid(errors)
    }
  }

  pub fn is_valid(&self) -> bool {
    matches!(self, Validated::Valid(_))
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub email: String,
  #[serde(default, skip_serializing)]
  pub password1: String,
  #[serde(default, skip_serializing)]
  pub password2: String,
}

/// `username` accepts either a username or an email address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
  #[serde(default)]
  pub username: String,
  #[serde(default, skip_serializing)]
  pub password: String,
  #[serde(default)]
  pub next: Option<String>,
}

/// Raw add-product input. `price` stays a string until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductForm {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub price: String,
}

/// Registration data that passed field validation. Uniqueness is checked
/// against the user store separately.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
  pub username: String,
  pub email: String,
  pub password: String,
}

fn username_char_allowed(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

pub fn is_well_formed_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.rsplit_once('@') else {
    return false;
  };
  if local.is_empty() || local.contains('@') {
    return false;
  }
  let labels: Vec<&str> = domain.split('.').collect();
  labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

pub fn validate_registration(form: &RegisterForm) -> Validated<ValidRegistration> {
  let mut errors = FieldErrors::new();
  let username = form.username.trim();
  let email = form.email.trim();

  if username.is_empty() {
    errors.add("username", "This field is required.");
  } else {
    if username.chars().count() > USERNAME_MAX_LEN {
      errors.add(
        "username",
        format!("Ensure this value has at most {} characters.", USERNAME_MAX_LEN),
      );
    }
    if !username.chars().all(username_char_allowed) {
      errors.add(
        "username",
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
      );
    }
  }

  if email.is_empty() {
    errors.add("email", "This field is required.");
  } else if !is_well_formed_email(email) {
    errors.add("email", "Enter a valid email address.");
  }

  if form.password1.is_empty() {
    errors.add("password1", "This field is required.");
  }
  if form.password2.is_empty() {
    errors.add("password2", "This field is required.");
  }
  if !form.password1.is_empty() && !form.password2.is_empty() {
    if form.password1 != form.password2 {
      errors.add("password2", "The two password fields didn't match.");
    } else {
      if form.password1.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
          "password2",
          format!(
            "This password is too short. It must contain at least {} characters.",
            PASSWORD_MIN_LEN
          ),
        );
      }
      if form.password1.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password2", "This password is entirely numeric.");
      }
    }
  }

  Validated::from_errors(errors, || ValidRegistration {
    username: username.to_string(),
    email: email.to_string(),
    password: form.password1.clone(),
  })
}

pub fn validate_login(form: &LoginForm) -> Validated<(String, String)> {
  let mut errors = FieldErrors::new();
  let identifier = form.username.trim();
  if identifier.is_empty() {
    errors.add("username", "This field is required.");
  }
  if form.password.is_empty() {
    errors.add("password", "This field is required.");
  }
  Validated::from_errors(errors, || (identifier.to_string(), form.password.clone()))
}

pub fn validate_product(form: &ProductForm) -> Validated<NewProduct> {
  let mut errors = FieldErrors::new();
  let name = form.name.trim();
  let description = form.description.trim();

  if name.is_empty() {
    errors.add("name", "This field is required.");
  } else if name.chars().count() > PRODUCT_NAME_MAX_LEN {
    errors.add(
      "name",
      format!("Ensure this value has at most {} characters.", PRODUCT_NAME_MAX_LEN),
    );
  }

  if description.is_empty() {
    errors.add("description", "This field is required.");
  }

  let price = form.price.trim();
  let mut parsed_price = 0i64;
  if price.is_empty() {
    errors.add("price", "This field is required.");
  } else {
    match price.parse::<i64>() {
      Ok(p) if p >= 0 => parsed_price = p,
      Ok(_) => errors.add("price", "Ensure this value is greater than or equal to 0."),
      Err(_) => errors.add("price", "Enter a whole number."),
    }
  }

  Validated::from_errors(errors, || NewProduct {
    name: name.to_string(),
    description: description.to_string(),
    price: parsed_price,
  })
}
