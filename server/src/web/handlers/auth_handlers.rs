// storefront_server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::guard::{safe_next, GuardChain};
use storefront::validation::{validate_login, FieldErrors, LoginForm, RegisterForm, Validated};
use storefront::{MessageLevel, ShopError};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::responses::{page, redirect};
use crate::web::session::Visitor;

pub const LOGIN_FAILED_MESSAGE: &str = "Please enter a correct username/email and password.";

#[derive(Deserialize, Debug)]
pub struct NextQuery {
  pub next: Option<String>,
}

fn render_register(visitor: &Visitor, form: &RegisterForm, errors: &FieldErrors) -> HttpResponse {
  page(visitor, "register", json!({ "form": form, "errors": errors }))
}

fn render_login(visitor: &Visitor, form: &LoginForm, errors: &FieldErrors) -> HttpResponse {
  let next = safe_next(form.next.as_deref());
  page(visitor, "login", json!({ "form": form, "errors": errors, "next": next }))
}

#[instrument(name = "handler::register_form", skip(visitor))]
pub async fn register_form_handler(visitor: Visitor) -> Result<HttpResponse, AppError> {
  if let Some(away) = visitor.guard(&GuardChain::anonymous(), "/register") {
    return Ok(away);
  }
  Ok(render_register(&visitor, &RegisterForm::default(), &FieldErrors::new()))
}

#[instrument(name = "handler::register", skip(app_state, visitor, form), fields(username = %form.username))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  visitor: Visitor,
  form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
  if let Some(away) = visitor.guard(&GuardChain::anonymous(), "/register") {
    return Ok(away);
  }

  let form = form.into_inner();
  match app_state.accounts.register(form.clone()).await {
    Ok(user) => {
      info!(user_id = user.id, "Registration succeeded.");
      visitor
        .session
        .push_message(MessageLevel::Success, "Registration successful. You can now log in.");
      Ok(redirect("/login"))
    }
    Err(ShopError::Validation(errors)) => {
      warn!(fields = %errors, "Registration rejected.");
      visitor
        .session
        .push_message(MessageLevel::Error, "Registration failed. Please check the form.");
      Ok(render_register(&visitor, &form, &errors))
    }
    Err(other) => Err(other.into()),
  }
}

#[instrument(name = "handler::login_form", skip(visitor, query))]
pub async fn login_form_handler(visitor: Visitor, query: web::Query<NextQuery>) -> Result<HttpResponse, AppError> {
  if let Some(away) = visitor.guard(&GuardChain::anonymous(), "/login") {
    return Ok(away);
  }
  let form = LoginForm {
    next: query.into_inner().next,
    ..LoginForm::default()
  };
  Ok(render_login(&visitor, &form, &FieldErrors::new()))
}

#[instrument(name = "handler::login", skip(req, app_state, visitor, form))]
pub async fn login_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  mut visitor: Visitor,
  form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
  if let Some(away) = visitor.guard(&GuardChain::anonymous(), "/login") {
    return Ok(away);
  }

  let form = form.into_inner();
  let (identifier, password) = match validate_login(&form) {
    Validated::Valid(credentials) => credentials,
    Validated::Invalid(errors) => return Ok(render_login(&visitor, &form, &errors)),
  };

  match app_state.accounts.authenticate(&identifier, &password).await {
    Ok(user) => {
      visitor.login(&req, &user);
      visitor
        .session
        .push_message(MessageLevel::Success, "You are now logged in.");
      Ok(redirect(&safe_next(form.next.as_deref())))
    }
    Err(ShopError::Authentication) => {
      let mut errors = FieldErrors::new();
      errors.add("__all__", LOGIN_FAILED_MESSAGE);
      visitor
        .session
        .push_message(MessageLevel::Error, "Login failed. Please check your details.");
      Ok(render_login(&visitor, &form, &errors))
    }
    Err(other) => Err(other.into()),
  }
}

/// Drops the whole session, cart included.
#[instrument(name = "handler::logout", skip(visitor))]
pub async fn logout_handler(visitor: Visitor) -> Result<HttpResponse, AppError> {
  visitor.session.logout();
  visitor
    .session
    .push_message(MessageLevel::Success, "You have been logged out.");
  Ok(redirect("/"))
}
