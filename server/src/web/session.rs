// storefront_server/src/web/session.rs

//! Cookie-backed sessions: a middleware that assigns every visitor a session
//! id, and the `Visitor` extractor that handlers use to reach the session and
//! the logged-in identity.

use crate::config::DEFAULT_SESSION_COOKIE;
use crate::errors::AppError;
use crate::state::AppState;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use storefront::guard::{GuardChain, GuardOutcome, GuardRequest};
use storefront::models::{Identity, User};
use storefront::Session;
use tracing::debug;
use uuid::Uuid;

use super::responses::redirect;

/// The session id resolved for the current request.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

fn cookie_name(req: &ServiceRequest) -> String {
  req
    .app_data::<web::Data<AppState>>()
    .map(|state| state.config.session_cookie_name.clone())
    .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string())
}

pub async fn session_middleware(
  req: ServiceRequest,
  next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
  let name = cookie_name(&req);
  let existing = req
    .cookie(&name)
    .map(|c| c.value().to_string())
    .filter(|value| Uuid::parse_str(value).is_ok());

  let (session_id, is_new) = match existing {
    Some(id) => (id, false),
    None => (Uuid::new_v4().to_string(), true),
  };
  req.extensions_mut().insert(SessionId(session_id.clone()));

  let mut res = next.call(req).await?;

  // A handler may have moved the session to a fresh id (login).
  let current = res.request().extensions().get::<SessionId>().map(|id| id.0.clone());
  let issue = match current {
    Some(rotated) if rotated != session_id => Some(rotated),
    _ if is_new => Some(session_id),
    _ => None,
  };
  if let Some(value) = issue {
    debug!("Issuing a session cookie.");
    let cookie = Cookie::build(name, value)
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .finish();
    res.response_mut().add_cookie(&cookie)?;
  }
  Ok(res)
}

/// The session plus the resolved identity of whoever sent the request.
pub struct Visitor {
  pub session: Session,
  pub identity: Option<Identity>,
}

impl Visitor {
  /// Authenticates the visitor under a newly issued session id. The old id
  /// keeps nothing, and the response carries the new cookie.
  pub fn login(&mut self, req: &HttpRequest, user: &User) {
    self.session.login(user, Uuid::new_v4().to_string());
    req.extensions_mut().insert(SessionId(self.session.id().to_string()));
    self.identity = Some(Identity::from(user));
  }

  /// `Some(redirect)` when the chain turns the visitor away.
  pub fn guard(&self, chain: &GuardChain, return_to: &str) -> Option<HttpResponse> {
    let request = GuardRequest {
      identity: self.identity.as_ref(),
      return_to,
    };
    match chain.check(&request) {
      GuardOutcome::Proceed => None,
      GuardOutcome::Redirect(location) => Some(redirect(&location)),
    }
  }
}

impl FromRequest for Visitor {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let session_id = req.extensions().get::<SessionId>().cloned();

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("application state is not configured".to_string()))?;
      let SessionId(id) =
        session_id.ok_or_else(|| AppError::Internal("session middleware is not installed".to_string()))?;

      let session = Session::new(id, state.sessions.clone());
      let identity = session.identity(state.users.as_ref()).await?;
      Ok(Visitor { session, identity })
    })
  }
}
