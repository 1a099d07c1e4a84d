//! Error taxonomy for the client core.
//!
//! Two boundaries produce errors: the remote gateway and the local store.
//! Neither class ever reaches a view as an `Err`; the session layer turns
//! gateway failures into inline form messages and treats store corruption
//! as clear-and-continue.

use thiserror::Error;

/// Failure crossing the remote gateway boundary.
///
/// Variants carry the human-readable `message` the backend supplied when
/// the error body was recognizable.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Login or signup rejected (wrong password, duplicate account).
    #[error("{0}")]
    Credentials(String),

    /// Reset token invalid, expired, or already consumed. Terminal for
    /// that token value; callers must not retry with it.
    #[error("{0}")]
    ResetToken(String),

    /// 403 from a guarded endpoint. Callers translate this into a
    /// navigation redirect, never into visible text.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No usable response reached the backend.
    #[error("network error: {0}")]
    Transport(String),

    /// The endpoint rejected the call outside the classes above, or the
    /// response did not match the documented contract. `message` is
    /// present when the error body carried one.
    #[error("request failed (status {status})")]
    Backend { status: u16, message: Option<String> },
}

impl GatewayError {
    /// The message a form should display inline, if the backend supplied
    /// one. `None` means the caller falls back to its generic message.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Credentials(msg) | Self::ResetToken(msg) => Some(msg),
            Self::Backend { message, .. } => message.as_deref(),
            Self::Forbidden(_) | Self::Transport(_) => None,
        }
    }
}

/// Failure in the local persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
