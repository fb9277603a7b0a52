//! JWT issuance and verification (HS256, shared secret).
//!
//! Tokens are stateless: expiry is the only invalidation. The access token is
//! addressed to the recruiting API, the identity token to the client that
//! asked for it, so neither can be replayed where the other is expected.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::models::auth::{AccessClaims, IdClaims, User};

/// Access and identity token lifetime: 1 hour.
pub const TOKEN_EXPIRY_SECS: i64 = 60 * 60;

/// Audience of every access token: the recruiting API.
pub const API_AUDIENCE: &str = "eyb-api";

/// Scope granted to every access token.
pub const DEFAULT_SCOPE: &str = "basic";

/// Signs and verifies tokens for one issuer.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    issuer: String,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"***REDACTED***")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenIssuer {
    /// `issuer` is the authorization server's own base URL.
    pub fn new(secret: &[u8], issuer: &str) -> Self {
        Self {
            secret: secret.to_vec(),
            issuer: issuer.to_string(),
        }
    }

    /// Mint an access token for `user` acting through `client_id`.
    pub fn create_access_token(&self, user: &User, client_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.clone(),
            role: user.role,
            client_id: client_id.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_EXPIRY_SECS)).timestamp(),
            iss: self.issuer.clone(),
            aud: API_AUDIENCE.to_string(),
        };
        self.sign(&claims)
    }

    /// Mint an identity token for `user`, addressed to `client_id`.
    pub fn create_id_token(&self, user: &User, client_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = IdClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_EXPIRY_SECS)).timestamp(),
            iss: self.issuer.clone(),
            aud: client_id.to_string(),
        };
        self.sign(&claims)
    }

    /// Verify an access token (signature, expiry, issuer, API audience).
    pub fn verify_access_token(&self, token: &str) -> Option<AccessClaims> {
        self.verify(token, API_AUDIENCE)
    }

    /// Verify an identity token minted for `client_id`.
    pub fn verify_id_token(&self, token: &str, client_id: &str) -> Option<IdClaims> {
        self.verify(token, client_id)
    }

    fn sign<T: serde::Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    fn verify<T: serde::de::DeserializeOwned>(&self, token: &str, audience: &str) -> Option<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[audience]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        match decode::<T>(token, &DecodingKey::from_secret(&self.secret), &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    const ISSUER: &str = "http://localhost:4000";

    fn user() -> User {
        User {
            id: "u2".into(),
            email: "recruiter@example.com".into(),
            role: Role::Recruiter,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret", ISSUER)
    }

    #[test]
    fn access_token_round_trip() {
        let tokens = issuer();
        let token = tokens.create_access_token(&user(), "eyb-frontend").unwrap();
        let claims = tokens.verify_access_token(&token).expect("valid");
        assert_eq!(claims.sub, "u2");
        assert_eq!(claims.role, Role::Recruiter);
        assert_eq!(claims.client_id, "eyb-frontend");
        assert_eq!(claims.scope, "basic");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.aud, API_AUDIENCE);
        assert_eq!(claims.exp - claims.iat, TOKEN_EXPIRY_SECS);
    }

    #[test]
    fn id_token_round_trip() {
        let tokens = issuer();
        let token = tokens.create_id_token(&user(), "eyb-frontend").unwrap();
        let claims = tokens
            .verify_id_token(&token, "eyb-frontend")
            .expect("valid");
        assert_eq!(claims.email, "recruiter@example.com");
        assert_eq!(claims.aud, "eyb-frontend");
        assert_eq!(claims.exp - claims.iat, TOKEN_EXPIRY_SECS);
    }

    #[test]
    fn audiences_are_separated() {
        let tokens = issuer();
        let access = tokens.create_access_token(&user(), "eyb-frontend").unwrap();
        let id = tokens.create_id_token(&user(), "eyb-frontend").unwrap();

        let access_aud = tokens.verify_access_token(&access).unwrap().aud;
        let id_aud = tokens.verify_id_token(&id, "eyb-frontend").unwrap().aud;
        assert_ne!(access_aud, id_aud);

        // Neither token is accepted in the other's place.
        assert!(tokens.verify_access_token(&id).is_none());
        assert!(tokens.verify_id_token(&access, "eyb-frontend").is_none());
        // An identity token for one client is useless to another.
        assert!(tokens.verify_id_token(&id, "other-client").is_none());
    }

    #[test]
    fn wrong_secret_or_issuer_is_rejected() {
        let token = issuer().create_access_token(&user(), "eyb-frontend").unwrap();
        assert!(
            TokenIssuer::new(b"other-secret", ISSUER)
                .verify_access_token(&token)
                .is_none()
        );
        assert!(
            TokenIssuer::new(b"test-secret", "http://evil.example")
                .verify_access_token(&token)
                .is_none()
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = issuer();
        let past = Utc::now() - Duration::hours(3);
        let claims = AccessClaims {
            sub: "u2".into(),
            role: Role::Recruiter,
            client_id: "eyb-frontend".into(),
            scope: DEFAULT_SCOPE.into(),
            iat: past.timestamp(),
            exp: (past + Duration::seconds(TOKEN_EXPIRY_SECS)).timestamp(),
            iss: ISSUER.into(),
            aud: API_AUDIENCE.into(),
        };
        let token = tokens.sign(&claims).unwrap();
        assert!(tokens.verify_access_token(&token).is_none());
    }

    #[test]
    fn token_is_three_part_jws() {
        let token = issuer().create_access_token(&user(), "eyb-frontend").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }
}
