//! Two-phase password reset.
//!
//! Phase one asks the backend to mint a reset token (returned inline,
//! valid for one hour, single use). Phase two submits the token with the
//! new password. The client keeps no state between the phases; the user
//! carries the token. Neither phase touches the session: after a
//! successful reset the user signs in again with the new password.

use std::sync::Arc;

use crate::gateway::AuthGateway;
use crate::session::{gateway_failure, OpOutcome};

/// Outcome of a reset request. On success the token the backend minted
/// is included for display; it is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequestOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub reset_token: Option<String>,
}

/// The request/consume protocol for a forgotten password.
pub struct PasswordResetFlow {
    gateway: Arc<dyn AuthGateway>,
}

impl PasswordResetFlow {
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Ask the backend to issue a reset token for `email`. Repeat
    /// requests each mint a fresh token; what happens to older ones is
    /// the backend's business.
    pub async fn request_reset(&self, email: &str) -> ResetRequestOutcome {
        match self.gateway.request_password_reset(email).await {
            Ok(issued) => ResetRequestOutcome {
                success: true,
                message: issued
                    .message
                    .or_else(|| Some("Reset token generated.".into())),
                reset_token: issued.reset_token,
            },
            Err(err) => {
                let outcome = gateway_failure(err, "Unable to request password reset");
                ResetRequestOutcome {
                    success: false,
                    message: outcome.message,
                    reset_token: None,
                }
            }
        }
    }

    /// Submit a reset token with the new password.
    ///
    /// The confirmation mismatch is caught here, before any network
    /// call. A rejected token (expired, consumed, unknown) is terminal;
    /// the caller must request a fresh one rather than retry.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> OpOutcome {
        if new_password != confirm_password {
            return OpOutcome::fail("New password and confirmation do not match.");
        }

        match self.gateway.reset_password(token, new_password).await {
            Ok(confirmed) => OpOutcome::ok_with(confirmed.message.unwrap_or_else(|| {
                "Password reset successful. You can now sign in.".into()
            })),
            Err(err) => gateway_failure(err, "Unable to reset password"),
        }
    }
}
