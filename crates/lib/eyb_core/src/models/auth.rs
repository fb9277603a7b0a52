//! Authorization-server domain models.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role carried in tokens and used for server-side gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Recruiter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "recruiter" => Ok(Role::Recruiter),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A user known to the authorization server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// User with password hash (for credential checks only).
#[derive(Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

impl fmt::Debug for UserWithPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserWithPassword")
            .field("user", &self.user)
            .field("password_hash", &"***REDACTED***")
            .finish()
    }
}

/// A registered OAuth client.
#[derive(Clone)]
pub struct Client {
    /// Public `client_id`.
    pub id: String,
    pub name: String,
    pub secret_hash: String,
    /// Exact-match allow-list. No prefix or pattern matching.
    pub redirect_uris: HashSet<String>,
}

impl Client {
    /// Whether `redirect_uri` is byte-for-byte one of the registered URIs.
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.contains(redirect_uri)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret_hash", &"***REDACTED***")
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

/// Login session at the authorization server (`sid` cookie → user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub sid: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// One-time authorization code bound to a user, client and redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub user_id: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationCode {
    /// Expired strictly after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Claims embedded in access tokens (audience: the recruiting API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user ID.
    pub sub: String,
    pub role: Role,
    pub client_id: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Claims embedded in identity tokens (audience: the requesting client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Recruiter, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Recruiter).unwrap();
        assert_eq!(json, "\"recruiter\"");
    }

    #[test]
    fn client_redirect_match_is_exact() {
        let client = Client {
            id: "c".into(),
            name: "C".into(),
            secret_hash: String::new(),
            redirect_uris: HashSet::from(["http://localhost:3000/auth/callback".to_string()]),
        };
        assert!(client.allows_redirect("http://localhost:3000/auth/callback"));
        assert!(!client.allows_redirect("http://localhost:3000/auth/callback/"));
        assert!(!client.allows_redirect("http://localhost:3000/auth/callback?x=1"));
        assert!(!client.allows_redirect("http://localhost:3000/auth"));
        assert!(!client.allows_redirect("HTTP://localhost:3000/auth/callback"));
    }

    #[test]
    fn code_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let code = AuthorizationCode {
            code: "c".into(),
            user_id: "u".into(),
            client_id: "c".into(),
            redirect_uri: "r".into(),
            expires_at: now,
        };
        assert!(!code.is_expired_at(now));
        assert!(code.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let user = UserWithPassword {
            user: User {
                id: "u1".into(),
                email: "a@b.c".into(),
                role: Role::User,
            },
            password_hash: "$2b$10$abcdef".into(),
        };
        let rendered = format!("{user:?}");
        assert!(!rendered.contains("$2b$"));
        assert!(rendered.contains("REDACTED"));
    }
}
