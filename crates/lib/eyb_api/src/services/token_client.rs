//! Client side of the authorization-code exchange, used by the OAuth callback.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::handlers::oauth::TokenResponse;

/// Reason reported to the frontend when the endpoint gave none.
const GENERIC_FAILURE: &str = "token_request_failed";

#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("Token endpoint rejected the code: {0}")]
    Rejected(String),

    #[error("Token request failed: {0}")]
    Transport(String),
}

impl TokenExchangeError {
    /// Value for the `error` parameter of the redirect back to the frontend.
    pub fn redirect_reason(&self) -> &str {
        match self {
            TokenExchangeError::Rejected(reason) => reason,
            TokenExchangeError::Transport(_) => GENERIC_FAILURE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// POST the form-encoded `authorization_code` grant to `endpoint`.
pub async fn exchange_code(
    http: &reqwest::Client,
    endpoint: &str,
    code: &str,
    client_id: &str,
    redirect_uri: &str,
) -> Result<TokenResponse, TokenExchangeError> {
    let resp = http
        .post(endpoint)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| TokenExchangeError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let reason = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error_description.or(body.error))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        warn!(status = status.as_u16(), reason = %reason, "token exchange rejected");
        return Err(TokenExchangeError::Rejected(reason));
    }

    resp.json::<TokenResponse>()
        .await
        .map_err(|e| TokenExchangeError::Transport(e.to_string()))
}
