//! Authentication middleware: access-token extraction and verification.
//!
//! The recruiting API is the sole authority on roles: handlers gate on the
//! verified claims injected here, never on anything the browser decoded.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use eyb_core::models::auth::{AccessClaims, Role};

use crate::ApiState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_TOKEN_COOKIE;

/// Verified caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AccessClaims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == Role::Admin
    }

    /// Fail with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role '{}' may not perform this action",
                self.0.role
            )))
        }
    }

    /// Recruiter or admin.
    pub fn require_recruiter(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Recruiter, Role::Admin])
    }
}

/// Axum middleware: takes the access token from `Authorization: Bearer <token>`
/// or the `access_token` cookie, verifies it, and injects `AuthenticatedUser`.
pub async fn require_auth(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match header {
        Some(value) => bearer_token(value)
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?
            .to_string(),
        None => CookieJar::from_headers(request.headers())
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| AppError::Unauthorized("Missing access token".into()))?,
    };

    let claims = state
        .tokens
        .verify_access_token(&token)
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}

/// Token of a `Bearer` authorization header. The scheme is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim_start();
    (!token.is_empty()).then_some(token)
}
