//! Session ownership and the operations that mutate it.
//!
//! [`SessionController`] is the single source of truth for "who is signed
//! in". Views never touch the store or the gateway directly: they call an
//! operation here, the controller talks to the backend, persists the
//! result, and then informs every registered observer synchronously.
//!
//! Failure policy: no public operation returns `Err` or panics on backend
//! misbehavior. Everything comes back as an [`OpOutcome`] whose message
//! is ready for inline display next to the triggering form.

pub mod reset;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, StoreError};
use crate::gateway::{AuthGateway, AuthPayload};
use crate::policy::Capabilities;
use crate::session::reset::{PasswordResetFlow, ResetRequestOutcome};
use crate::store::{KeyValueStore, KEY_TOKEN, KEY_USER};

// ── Data model ───────────────────────────────────────────────────

/// Account role. Assigned by the backend, never mutated client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The account record the backend returns and the client persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "isSubscribed", default)]
    pub is_subscribed: bool,
}

/// The active authenticated identity: the opaque backend token plus the
/// user record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

// ── Operation outcomes ───────────────────────────────────────────

/// Result shape of every controller operation. A failed outcome carries
/// the message the triggering form should show inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl OpOutcome {
    pub(crate) fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub(crate) fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub(crate) fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Turn a gateway failure into a form-ready outcome. The backend message
/// wins when it is recognizable; otherwise the operation's generic
/// fallback is shown.
fn gateway_failure(err: GatewayError, fallback: &str) -> OpOutcome {
    tracing::debug!("gateway call failed: {err}");
    match err.user_message() {
        Some(message) => OpOutcome::fail(message),
        None => OpOutcome::fail(fallback),
    }
}

// ── Observers ────────────────────────────────────────────────────

/// Callback seam for anything that renders from the session.
///
/// Observers run synchronously on the mutating task, after the store and
/// the in-memory state agree. They must not call back into the
/// controller.
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, session: Option<&Session>);
}

// ── Controller ───────────────────────────────────────────────────

/// Owns the client's one session and every transition it can make.
///
/// State machine: `Unauthenticated → Authenticated` on login/signup
/// success, back on logout or detected corruption of the persisted
/// record, and `subscribed: false → true` on subscribe success. Failed
/// operations leave the state untouched.
pub struct SessionController {
    store: Arc<dyn KeyValueStore>,
    gateway: Arc<dyn AuthGateway>,
    session: parking_lot::Mutex<Option<Session>>,
    observers: parking_lot::Mutex<Vec<Arc<dyn SessionObserver>>>,
    /// Serializes mutating operations so a double-submitted action runs
    /// against the settled state of the first, never interleaved with it.
    op_lock: tokio::sync::Mutex<()>,
}

impl SessionController {
    pub fn new(store: Arc<dyn KeyValueStore>, gateway: Arc<dyn AuthGateway>) -> Self {
        Self {
            store,
            gateway,
            session: parking_lot::Mutex::new(None),
            observers: parking_lot::Mutex::new(Vec::new()),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// Capability flags derived from the current session.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::of(self.session.lock().as_ref())
    }

    /// Register an observer. It is NOT called for state that predates
    /// registration; call [`Self::current`] for the starting point.
    pub fn observe(&self, observer: Arc<dyn SessionObserver>) {
        self.observers.lock().push(observer);
    }

    fn notify(&self) {
        let session = self.current();
        let observers: Vec<_> = self.observers.lock().clone();
        for observer in observers {
            observer.session_changed(session.as_ref());
        }
    }

    // ── Startup ──────────────────────────────────────────────

    /// Load the persisted session, once, at startup.
    ///
    /// Both keys must be present and the user record must parse as a
    /// well-formed [`User`]; anything less clears both keys and leaves
    /// the client unauthenticated. That path is expected (first run,
    /// cleared storage, schema change) and surfaces no error. Returns
    /// whether a session was restored.
    pub fn restore(&self) -> bool {
        let token = self.store.get(KEY_TOKEN).ok().flatten();
        let raw_user = self.store.get(KEY_USER).ok().flatten();

        let restored = match (token, raw_user) {
            (Some(token), Some(raw)) if !token.is_empty() => {
                match serde_json::from_str::<User>(&raw) {
                    Ok(user) => Some(Session { token, user }),
                    Err(err) => {
                        tracing::warn!("discarding unreadable stored session: {err}");
                        None
                    }
                }
            }
            _ => None,
        };

        if restored.is_none() {
            self.discard_persisted();
        }

        let active = restored.is_some();
        *self.session.lock() = restored;
        self.notify();
        active
    }

    // ── Authentication ───────────────────────────────────────

    /// Verify credentials against the backend and activate the returned
    /// session. On failure the state is untouched; there is no partial
    /// login.
    pub async fn login(&self, email: &str, password: &str) -> OpOutcome {
        let _guard = self.op_lock.lock().await;
        match self.gateway.login(email, password).await {
            Ok(payload) => self.activate(payload, "Login failed"),
            Err(err) => gateway_failure(err, "Login failed"),
        }
    }

    /// Register a new account. The backend returns a token with the new
    /// user, so signup success is immediately an authenticated state.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> OpOutcome {
        let _guard = self.op_lock.lock().await;
        match self.gateway.signup(username, email, password).await {
            Ok(payload) => self.activate(payload, "Signup failed"),
            Err(err) => gateway_failure(err, "Signup failed"),
        }
    }

    /// Drop the session, persisted and in-memory. Safe to call at any
    /// time, signed in or not; stray keys are cleared either way.
    pub async fn logout(&self) -> OpOutcome {
        let _guard = self.op_lock.lock().await;
        self.discard_persisted();
        *self.session.lock() = None;
        self.notify();
        OpOutcome::ok()
    }

    // ── Subscription ─────────────────────────────────────────

    /// Activate the subscription for the signed-in account. The flag
    /// flips only on the backend's confirmation; there is no optimistic
    /// update.
    pub async fn subscribe(&self) -> OpOutcome {
        let _guard = self.op_lock.lock().await;
        let Some(token) = self.bearer() else {
            return OpOutcome::fail("Not signed in");
        };

        match self.gateway.subscribe(&token).await {
            Ok(user) => self.replace_user(user, "Subscription failed"),
            Err(err) => gateway_failure(err, "Subscription failed"),
        }
    }

    /// Re-fetch the subscription flag from the backend and fold it into
    /// the live session record. The rebuild starts from the in-memory
    /// user under the operation lock, so no concurrent update can be
    /// overwritten by a stale snapshot.
    pub async fn refresh_user(&self) -> OpOutcome {
        let _guard = self.op_lock.lock().await;
        let Some(token) = self.bearer() else {
            return OpOutcome::fail("Not signed in");
        };

        match self.gateway.subscription_status(&token).await {
            Ok(is_subscribed) => {
                let Some(mut user) = self.session.lock().as_ref().map(|s| s.user.clone()) else {
                    return OpOutcome::fail("Not signed in");
                };
                user.is_subscribed = is_subscribed;
                self.replace_user(user, "Unable to refresh account")
            }
            Err(err) => gateway_failure(err, "Unable to refresh account"),
        }
    }

    // ── Password reset ───────────────────────────────────────

    /// Ask the backend for a reset token. Does not touch the session.
    pub async fn request_password_reset(&self, email: &str) -> ResetRequestOutcome {
        self.reset_flow().request_reset(email).await
    }

    /// Consume a reset token. Does not touch the session; on success the
    /// user signs in again with the new password.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> OpOutcome {
        self.reset_flow()
            .reset_password(token, new_password, confirm_password)
            .await
    }

    /// The reset flow against this controller's gateway, for callers
    /// that drive it directly.
    pub fn reset_flow(&self) -> PasswordResetFlow {
        PasswordResetFlow::new(Arc::clone(&self.gateway))
    }

    // ── Internals ────────────────────────────────────────────

    fn bearer(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.token.clone())
    }

    /// Persist both keys, then swap the in-memory session. A storage
    /// failure reports the fallback message and leaves the previous
    /// state in place.
    fn activate(&self, payload: AuthPayload, fallback: &str) -> OpOutcome {
        if let Err(err) = self.persist(&payload.token, &payload.user) {
            tracing::warn!("failed to persist session: {err}");
            return OpOutcome::fail(fallback);
        }

        *self.session.lock() = Some(Session {
            token: payload.token,
            user: payload.user,
        });
        self.notify();
        OpOutcome::ok()
    }

    /// Persist an updated user record for the current session, then swap
    /// it in memory. The token is unchanged.
    fn replace_user(&self, user: User, fallback: &str) -> OpOutcome {
        let raw = match serde_json::to_string(&user) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("failed to encode user record: {err}");
                return OpOutcome::fail(fallback);
            }
        };
        if let Err(err) = self.store.set(KEY_USER, &raw) {
            tracing::warn!("failed to persist user record: {err}");
            return OpOutcome::fail(fallback);
        }

        if let Some(session) = self.session.lock().as_mut() {
            session.user = user;
        }
        self.notify();
        OpOutcome::ok()
    }

    fn persist(&self, token: &str, user: &User) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user)
            .map_err(|e| StoreError::Backend(format!("encode user record: {e}")))?;
        self.store.set(KEY_TOKEN, token)?;
        self.store.set(KEY_USER, &raw)?;
        Ok(())
    }

    fn discard_persisted(&self) {
        for key in [KEY_TOKEN, KEY_USER] {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!("failed to clear stored session key {key}: {err}");
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
