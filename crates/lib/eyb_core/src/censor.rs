//! Client for the external CV anonymization ("censor") service.
//!
//! `POST {base}/anonymize` with `{cvBase64, FirstName, LastName}`; a
//! well-formed reply is `{markdown}` with the redacted CV. Every call carries
//! a timeout and any failure is reported, never papered over.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Anonymization collaborator errors.
#[derive(Debug, Error)]
pub enum CensorError {
    #[error("Invalid censor URL: {0}")]
    InvalidUrl(String),

    #[error("Censor request timed out")]
    Timeout,

    #[error("Censor unreachable: {0}")]
    Transport(String),

    #[error("Censor returned HTTP {0}")]
    Status(u16),

    #[error("Malformed censor response: {0}")]
    Malformed(String),
}

/// Request body understood by the censor service.
#[derive(Debug, Clone, Serialize)]
pub struct AnonymizeRequest {
    #[serde(rename = "cvBase64")]
    pub cv_base64: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
struct AnonymizeResponse {
    markdown: String,
}

/// Seam over the anonymization service.
#[async_trait]
pub trait Anonymizer: Send + Sync {
    /// Returns the censored CV as markdown.
    async fn anonymize(&self, request: &AnonymizeRequest) -> Result<String, CensorError>;
}

/// HTTP client for the censor service.
#[derive(Clone, Debug)]
pub struct CensorClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl CensorClient {
    /// `base_url` is e.g. `http://censor:8000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CensorError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("/anonymize"))
            .map_err(|e| CensorError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CensorError::Transport(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    /// Build from host and port as configured in the environment.
    pub fn from_host_port(host: &str, port: u16, timeout: Duration) -> Result<Self, CensorError> {
        Self::new(&format!("http://{host}:{port}"), timeout)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Anonymizer for CensorClient {
    async fn anonymize(&self, request: &AnonymizeRequest) -> Result<String, CensorError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CensorError::Timeout
                } else {
                    CensorError::Transport(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            warn!(status, "censor service rejected CV");
            return Err(CensorError::Status(status));
        }

        let body = resp
            .json::<AnonymizeResponse>()
            .await
            .map_err(|e| CensorError::Malformed(e.to_string()))?;

        if body.markdown.trim().is_empty() {
            return Err(CensorError::Malformed("empty markdown".into()));
        }

        debug!(bytes = body.markdown.len(), "CV anonymized");
        Ok(body.markdown)
    }
}
