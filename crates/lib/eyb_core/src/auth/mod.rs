//! Authorization-server logic.
//!
//! Provides the static credential & client registry, the session and
//! authorization-code stores, and JWT issuance/verification shared by the
//! authorization server and the recruiting API.

pub mod codes;
pub mod jwt;
pub mod password;
pub mod registry;
pub mod sessions;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
