//! Remote authentication gateway.
//!
//! The backend owns credentials, reset tokens, and the subscription flag;
//! the client reaches it only through [`AuthGateway`], so tests can swap
//! in a programmable double and the session layer never sees reqwest.
//!
//! Endpoints (JSON bodies):
//! - `POST /auth/login` `{email, password}` → `{token, user}`
//! - `POST /auth/signup` `{username, email, password}` → `{token, user}`
//! - `POST /auth/forgot-password` `{email}` → `{message, resetToken}`
//! - `POST /auth/reset-password` `{token, newPassword}` → `{message}`
//! - `POST /subscription/subscribe` (bearer) → `{user}`
//! - `GET /subscription/status` (bearer) → `{isSubscribed}`

mod http;

pub use http::HttpAuthGateway;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::session::User;

/// Token + user pair returned by login and signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Response to a password-reset request. The token is returned inline;
/// there is no out-of-band delivery in this backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetIssued {
    pub message: Option<String>,
    #[serde(rename = "resetToken")]
    pub reset_token: Option<String>,
}

/// Response to a consumed password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfirmed {
    pub message: Option<String>,
}

/// The backend REST service, as seen by the client.
///
/// Every method performs one round trip. Failures come back as
/// [`GatewayError`]; implementations never panic on backend behavior.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Verify credentials and obtain a session token.
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, GatewayError>;

    /// Register a new account. The returned identity is immediately
    /// authenticated; there is no verification step.
    async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, GatewayError>;

    /// Ask the backend to issue a password-reset token for `email`.
    async fn request_password_reset(&self, email: &str) -> Result<ResetIssued, GatewayError>;

    /// Consume a reset token, setting a new password. The backend
    /// enforces the one-hour window and single use.
    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<ResetConfirmed, GatewayError>;

    /// Activate the subscription for the account `bearer` belongs to.
    /// Returns the updated user record.
    async fn subscribe(&self, bearer: &str) -> Result<User, GatewayError>;

    /// Fetch the current subscription flag for the account `bearer`
    /// belongs to.
    async fn subscription_status(&self, bearer: &str) -> Result<bool, GatewayError>;
}

/// Programmable in-process backend for tests.
///
/// Models one registered account plus the reset-token ledger, and counts
/// every call so tests can assert that client-side validation short
/// circuits before the network.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::session::Role;

    pub(crate) struct FakeBackend {
        pub password: String,
        pub user: User,
        pub token: String,
        pub status_flag: AtomicBool,
        issued_reset_tokens: Mutex<HashSet<String>>,
        next_reset_id: AtomicUsize,
        pub login_calls: AtomicUsize,
        pub signup_calls: AtomicUsize,
        pub reset_request_calls: AtomicUsize,
        pub reset_consume_calls: AtomicUsize,
        pub subscribe_calls: AtomicUsize,
        pub status_calls: AtomicUsize,
    }

    impl FakeBackend {
        pub(crate) fn with_account(user: User, password: &str) -> Self {
            Self {
                password: password.to_string(),
                user,
                token: "tok-primary".to_string(),
                status_flag: AtomicBool::new(false),
                issued_reset_tokens: Mutex::new(HashSet::new()),
                next_reset_id: AtomicUsize::new(1),
                login_calls: AtomicUsize::new(0),
                signup_calls: AtomicUsize::new(0),
                reset_request_calls: AtomicUsize::new(0),
                reset_consume_calls: AtomicUsize::new(0),
                subscribe_calls: AtomicUsize::new(0),
                status_calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn standard() -> Self {
            Self::with_account(
                User {
                    id: "u-1".into(),
                    username: "alice".into(),
                    email: "a@b.com".into(),
                    role: Role::User,
                    is_subscribed: false,
                },
                "correct",
            )
        }
    }

    #[async_trait]
    impl AuthGateway for FakeBackend {
        async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, GatewayError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            if email == self.user.email && password == self.password {
                Ok(AuthPayload {
                    token: self.token.clone(),
                    user: self.user.clone(),
                })
            } else {
                Err(GatewayError::Credentials("Invalid credentials".into()))
            }
        }

        async fn signup(
            &self,
            username: &str,
            email: &str,
            _password: &str,
        ) -> Result<AuthPayload, GatewayError> {
            self.signup_calls.fetch_add(1, Ordering::SeqCst);
            if email == self.user.email {
                return Err(GatewayError::Credentials(
                    "An account with this email already exists".into(),
                ));
            }
            Ok(AuthPayload {
                token: "tok-signup".into(),
                user: User {
                    id: "u-2".into(),
                    username: username.into(),
                    email: email.into(),
                    role: Role::User,
                    is_subscribed: false,
                },
            })
        }

        async fn request_password_reset(
            &self,
            _email: &str,
        ) -> Result<ResetIssued, GatewayError> {
            self.reset_request_calls.fetch_add(1, Ordering::SeqCst);
            let id = self.next_reset_id.fetch_add(1, Ordering::SeqCst);
            let token = format!("T{id}");
            self.issued_reset_tokens.lock().insert(token.clone());
            Ok(ResetIssued {
                message: Some("Reset token generated.".into()),
                reset_token: Some(token),
            })
        }

        async fn reset_password(
            &self,
            token: &str,
            _new_password: &str,
        ) -> Result<ResetConfirmed, GatewayError> {
            self.reset_consume_calls.fetch_add(1, Ordering::SeqCst);
            if self.issued_reset_tokens.lock().remove(token) {
                Ok(ResetConfirmed {
                    message: Some("Password reset successful.".into()),
                })
            } else {
                Err(GatewayError::ResetToken(
                    "Reset token is invalid or has expired".into(),
                ))
            }
        }

        async fn subscribe(&self, bearer: &str) -> Result<User, GatewayError> {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            if bearer != self.token {
                return Err(GatewayError::Forbidden("invalid token".into()));
            }
            let mut user = self.user.clone();
            user.is_subscribed = true;
            Ok(user)
        }

        async fn subscription_status(&self, bearer: &str) -> Result<bool, GatewayError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if bearer != self.token {
                return Err(GatewayError::Forbidden("invalid token".into()));
            }
            Ok(self.status_flag.load(Ordering::SeqCst))
        }
    }
}
