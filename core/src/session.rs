// storefront/src/session.rs

//! Session storage keyed by an opaque session id, plus the typed `Session`
//! handle the request layer works with.

use crate::cart::Cart;
use crate::error::{ShopError, ShopResult};
use crate::models::{Identity, User, UserId};
use crate::store::UserStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const CART_KEY: &str = "cart";
pub const AUTH_USER_KEY: &str = "_auth_user_id";
pub const MESSAGES_KEY: &str = "_messages";

/// Key/value storage scoped by session id.
pub trait SessionStore: Send + Sync {
  fn get(&self, session: &str, key: &str) -> Option<Value>;

  fn set(&self, session: &str, key: &str, value: Value);

  fn remove(&self, session: &str, key: &str) -> Option<Value>;

  /// Removes every key of the session.
  fn flush(&self, session: &str);

  /// Moves every key of `from` under `to`. `from` no longer exists afterwards.
  fn rename(&self, from: &str, to: &str);
}

/// Two weeks, counted from the last request that touched the session.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug)]
struct SessionEntry {
  data: HashMap<String, Value>,
  last_access: Instant,
}

impl SessionEntry {
  fn new() -> Self {
    Self {
      data: HashMap::new(),
      last_access: Instant::now(),
    }
  }

  fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
    now.duration_since(self.last_access) > idle_timeout
  }
}

/// In-process sessions. A session idle for longer than the timeout reads as
/// empty and is evicted the next time a session is created.
#[derive(Debug)]
pub struct MemorySessionStore {
  sessions: RwLock<HashMap<String, SessionEntry>>,
  idle_timeout: Duration,
}

impl Default for MemorySessionStore {
  fn default() -> Self {
    Self::with_idle_timeout(DEFAULT_SESSION_IDLE_TIMEOUT)
  }
}

impl MemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
    Self {
      sessions: RwLock::new(HashMap::new()),
      idle_timeout,
    }
  }

  /// Live sessions, expired ones not counted.
  pub fn session_count(&self) -> usize {
    let now = Instant::now();
    self
      .sessions
      .read()
      .values()
      .filter(|entry| !entry.is_expired(now, self.idle_timeout))
      .count()
  }

  fn evict_expired(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(now, self.idle_timeout));
    let evicted = before - sessions.len();
    if evicted > 0 {
      debug!(evicted, remaining = sessions.len(), "Evicted idle sessions.");
    }
  }

  /// The live entry for `session`, created (after an eviction sweep) if needed.
  fn touch<'a>(&self, sessions: &'a mut HashMap<String, SessionEntry>, session: &str) -> &'a mut SessionEntry {
    let now = Instant::now();
    let live = sessions
      .get(session)
      .is_some_and(|entry| !entry.is_expired(now, self.idle_timeout));
    if !live {
      self.evict_expired(sessions, now);
    }
    let entry = sessions.entry(session.to_string()).or_insert_with(SessionEntry::new);
    entry.last_access = now;
    entry
  }
}

impl SessionStore for MemorySessionStore {
  fn get(&self, session: &str, key: &str) -> Option<Value> {
    let now = Instant::now();
    let mut sessions = self.sessions.write();
    let entry = sessions.get_mut(session)?;
    if entry.is_expired(now, self.idle_timeout) {
      sessions.remove(session);
      return None;
    }
    entry.last_access = now;
    entry.data.get(key).cloned()
  }

  fn set(&self, session: &str, key: &str, value: Value) {
    let mut sessions = self.sessions.write();
    self.touch(&mut sessions, session).data.insert(key.to_string(), value);
  }

  fn remove(&self, session: &str, key: &str) -> Option<Value> {
    let mut sessions = self.sessions.write();
    let entry = sessions.get_mut(session)?;
    let removed = entry.data.remove(key);
    if entry.data.is_empty() {
      sessions.remove(session);
    }
    removed
  }

  fn flush(&self, session: &str) {
    self.sessions.write().remove(session);
  }

  fn rename(&self, from: &str, to: &str) {
    let mut sessions = self.sessions.write();
    let Some(old) = sessions.remove(from) else {
      return;
    };
    if old.is_expired(Instant::now(), self.idle_timeout) {
      return;
    }
    self.touch(&mut sessions, to).data.extend(old.data);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
  Info,
  Success,
  Warning,
  Error,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
  pub level: MessageLevel,
  pub text: String,
}

/// One visitor's session.
#[derive(Clone)]
pub struct Session {
  id: String,
  store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session").finish_non_exhaustive()
  }
}

impl Session {
  pub fn new(id: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
    Self { id: id.into(), store }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// The stored cart, or an empty one. A value that does not decode is
  /// treated as empty.
  pub fn cart(&self) -> Cart {
    match self.store.get(&self.id, CART_KEY) {
      None => Cart::new(),
      Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "Discarding undecodable session cart.");
        Cart::new()
      }),
    }
  }

  pub fn set_cart(&self, cart: &Cart) -> ShopResult<()> {
    let value = serde_json::to_value(cart).map_err(|e| ShopError::Internal(format!("cart encoding: {}", e)))?;
    self.store.set(&self.id, CART_KEY, value);
    Ok(())
  }

  pub fn user_id(&self) -> Option<UserId> {
    self.store.get(&self.id, AUTH_USER_KEY).and_then(|v| v.as_i64())
  }

  /// Moves the session's data under `new_id` and marks it authenticated
  /// there. The previous id is left empty, and the cart survives.
  pub fn login(&mut self, user: &User, new_id: impl Into<String>) {
    let new_id = new_id.into();
    self.store.rename(&self.id, &new_id);
    self.id = new_id;
    self.store.set(&self.id, AUTH_USER_KEY, Value::from(user.id));
  }

  /// Drops everything, cart included.
  pub fn logout(&self) {
    self.store.flush(&self.id);
  }

  pub fn push_message(&self, level: MessageLevel, text: impl Into<String>) {
    let mut messages = self.peek_messages();
    messages.push(FlashMessage {
      level,
      text: text.into(),
    });
    match serde_json::to_value(&messages) {
      Ok(value) => self.store.set(&self.id, MESSAGES_KEY, value),
      Err(e) => warn!(error = %e, "Could not store flash message."),
    }
  }

  fn peek_messages(&self) -> Vec<FlashMessage> {
    self
      .store
      .get(&self.id, MESSAGES_KEY)
      .and_then(|v| serde_json::from_value(v).ok())
      .unwrap_or_default()
  }

  /// Returns and clears the pending messages.
  pub fn take_messages(&self) -> Vec<FlashMessage> {
    self
      .store
      .remove(&self.id, MESSAGES_KEY)
      .and_then(|v| serde_json::from_value(v).ok())
      .unwrap_or_default()
  }

  /// Resolves the stored user id. A missing or deactivated account yields
  /// `None` and the stale id is dropped.
  pub async fn identity(&self, users: &dyn UserStore) -> ShopResult<Option<Identity>> {
    let Some(user_id) = self.user_id() else {
      return Ok(None);
    };
    match users.find_by_id(user_id).await? {
      Some(user) if user.is_active => Ok(Some(Identity::from(&user))),
      _ => {
        warn!(user_id, "Session refers to a missing or inactive user.");
        self.store.remove(&self.id, AUTH_USER_KEY);
        Ok(None)
      }
    }
  }
}
