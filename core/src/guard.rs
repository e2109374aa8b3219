// storefront/src/guard.rs

//! Access guards composed as a chain of responsibility.
//!
//! Each guard looks at the request's identity and either lets it through or
//! names a redirect target. A `GuardChain` runs its guards in order and stops
//! at the first redirect.

use crate::models::Identity;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

pub const LOGIN_PATH: &str = "/login";

/// Query-component encoding that keeps path separators readable.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'/').remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
  Proceed,
  Redirect(String),
}

#[derive(Debug, Clone, Copy)]
pub struct GuardRequest<'a> {
  pub identity: Option<&'a Identity>,
  /// Where the visitor should land after logging in.
  pub return_to: &'a str,
}

pub type Guard = fn(&GuardRequest<'_>) -> GuardOutcome;

/// `/login?next=<next>`.
pub fn login_redirect(next: &str) -> String {
  format!("{}?next={}", LOGIN_PATH, utf8_percent_encode(next, NEXT_ENCODE_SET))
}

/// Accepts only same-site absolute paths; anything else becomes `/`.
pub fn safe_next(candidate: Option<&str>) -> String {
  match candidate.map(str::trim) {
    Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path.to_string(),
    _ => "/".to_string(),
  }
}

pub fn login_required(request: &GuardRequest<'_>) -> GuardOutcome {
  match request.identity {
    Some(_) => GuardOutcome::Proceed,
    None => GuardOutcome::Redirect(login_redirect(request.return_to)),
  }
}

/// Anonymous and non-staff visitors are both sent to the login page.
pub fn staff_required(request: &GuardRequest<'_>) -> GuardOutcome {
  match request.identity {
    Some(identity) if identity.is_staff => GuardOutcome::Proceed,
    _ => GuardOutcome::Redirect(login_redirect(request.return_to)),
  }
}

/// Keeps logged-in visitors away from the login and registration forms.
pub fn anonymous_only(request: &GuardRequest<'_>) -> GuardOutcome {
  match request.identity {
    Some(_) => GuardOutcome::Redirect("/".to_string()),
    None => GuardOutcome::Proceed,
  }
}

#[derive(Clone, Default)]
pub struct GuardChain {
  guards: Vec<(&'static str, Guard)>,
}

impl std::fmt::Debug for GuardChain {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.guards.iter().map(|(name, _)| name)).finish()
  }
}

impl GuardChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn then(mut self, name: &'static str, guard: Guard) -> Self {
    self.guards.push((name, guard));
    self
  }

  pub fn members() -> Self {
    Self::new().then("login_required", login_required)
  }

  pub fn staff() -> Self {
    Self::new()
      .then("login_required", login_required)
      .then("staff_required", staff_required)
  }

  pub fn anonymous() -> Self {
    Self::new().then("anonymous_only", anonymous_only)
  }

  pub fn check(&self, request: &GuardRequest<'_>) -> GuardOutcome {
    for (name, guard) in &self.guards {
      if let GuardOutcome::Redirect(location) = guard(request) {
        debug!(guard = *name, %location, "Guard redirected request.");
        return GuardOutcome::Redirect(location);
      }
    }
    GuardOutcome::Proceed
  }
}
