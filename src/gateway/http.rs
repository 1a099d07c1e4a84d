//! reqwest-backed implementation of [`AuthGateway`].

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::{AuthGateway, AuthPayload, ResetConfirmed, ResetIssued};
use crate::session::User;

/// Error body the backend sends on rejection. Anything that fails to
/// parse into this shape counts as unrecognizable.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscribeResponse {
    user: User,
}

/// Which failure class a backend rejection belongs to, by endpoint.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Credentials,
    Reset,
    Subscription,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "isSubscribed")]
    is_subscribed: bool,
}

/// HTTP client for the backend REST service.
pub struct HttpAuthGateway {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAuthGateway {
    /// Create a gateway against `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// The timeout bounds the whole request; there is no client-side
    /// cancellation beyond it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read a failed response into the taxonomy. The endpoint class
    /// labels a recognizable backend message; 403 is always an
    /// authorization failure.
    async fn rejection(resp: reqwest::Response, endpoint: Endpoint) -> GatewayError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());

        if status == reqwest::StatusCode::FORBIDDEN {
            return GatewayError::Forbidden(message.unwrap_or_else(|| "access denied".into()));
        }

        let status = status.as_u16();
        match (endpoint, message) {
            (Endpoint::Credentials, Some(message)) => GatewayError::Credentials(message),
            (Endpoint::Reset, Some(message)) => GatewayError::ResetToken(message),
            (Endpoint::Subscription, message) => GatewayError::Backend { status, message },
            (_, None) => GatewayError::Backend {
                status,
                message: None,
            },
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = resp.status();
        resp.json::<T>().await.map_err(|_| GatewayError::Backend {
            status: status.as_u16(),
            message: None,
        })
    }
}

#[async_trait::async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, GatewayError> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, Endpoint::Credentials).await);
        }
        Self::decode(resp).await
    }

    async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, GatewayError> {
        let resp = self
            .http
            .post(self.url("/auth/signup"))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, Endpoint::Credentials).await);
        }
        Self::decode(resp).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<ResetIssued, GatewayError> {
        let resp = self
            .http
            .post(self.url("/auth/forgot-password"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, Endpoint::Reset).await);
        }
        Self::decode(resp).await
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<ResetConfirmed, GatewayError> {
        let resp = self
            .http
            .post(self.url("/auth/reset-password"))
            .json(&json!({ "token": token, "newPassword": new_password }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, Endpoint::Reset).await);
        }
        Self::decode(resp).await
    }

    async fn subscribe(&self, bearer: &str) -> Result<User, GatewayError> {
        let resp = self
            .http
            .post(self.url("/subscription/subscribe"))
            .header("Authorization", format!("Bearer {bearer}"))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, Endpoint::Subscription).await);
        }
        Self::decode::<SubscribeResponse>(resp).await.map(|r| r.user)
    }

    async fn subscription_status(&self, bearer: &str) -> Result<bool, GatewayError> {
        let resp = self
            .http
            .get(self.url("/subscription/status"))
            .header("Authorization", format!("Bearer {bearer}"))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, Endpoint::Subscription).await);
        }
        Self::decode::<StatusResponse>(resp)
            .await
            .map(|r| r.is_subscribed)
    }
}
