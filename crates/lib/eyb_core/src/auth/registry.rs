//! Static credential & client registry.
//!
//! Read-only after construction. Lookups never fail loudly: an unknown user,
//! a wrong password or an unknown client all come back as `None`.

use std::collections::HashSet;

use tracing::debug;

use super::AuthError;
use super::password::{hash_password, verify_password};
use crate::models::auth::{Client, Role, User, UserWithPassword};

/// Client id of the bundled frontend.
pub const FRONTEND_CLIENT_ID: &str = "eyb-frontend";

/// Password shared by the seeded development accounts.
const DEMO_PASSWORD: &str = "password";

/// Secret of the seeded frontend client.
const DEMO_CLIENT_SECRET: &str = "super-secret";

/// Users and OAuth clients known to the authorization server.
#[derive(Debug)]
pub struct Registry {
    users: Vec<UserWithPassword>,
    clients: Vec<Client>,
    /// Verified against when the email is unknown so both failure paths
    /// cost one bcrypt round.
    dummy_hash: String,
}

impl Registry {
    /// Build a registry from pre-hashed users and clients.
    pub fn new(users: Vec<UserWithPassword>, clients: Vec<Client>) -> Result<Self, AuthError> {
        Ok(Self {
            users,
            clients,
            dummy_hash: hash_password("unknown-user")?,
        })
    }

    /// The development registry: three users (one per role) and the frontend
    /// client allowed to redirect to `frontend_redirect_uri`.
    pub fn demo(frontend_client_id: &str, frontend_redirect_uri: &str) -> Result<Self, AuthError> {
        let password_hash = hash_password(DEMO_PASSWORD)?;
        let seed = |id: &str, email: &str, role: Role| UserWithPassword {
            user: User {
                id: id.to_string(),
                email: email.to_string(),
                role,
            },
            password_hash: password_hash.clone(),
        };
        let users = vec![
            seed("u1", "user@example.com", Role::User),
            seed("u2", "recruiter@example.com", Role::Recruiter),
            seed("u3", "admin@example.com", Role::Admin),
        ];
        let clients = vec![Client {
            id: frontend_client_id.to_string(),
            name: "End Your Bias Frontend".to_string(),
            secret_hash: hash_password(DEMO_CLIENT_SECRET)?,
            redirect_uris: HashSet::from([frontend_redirect_uri.to_string()]),
        }];

        Ok(Self {
            users,
            clients,
            dummy_hash: password_hash,
        })
    }

    /// Email match is case-insensitive, password match is exact.
    pub fn find_user_by_email_and_password(&self, email: &str, password: &str) -> Option<User> {
        let email = email.to_lowercase();
        match self
            .users
            .iter()
            .find(|u| u.user.email.to_lowercase() == email)
        {
            Some(candidate) => {
                if verify_password(password, &candidate.password_hash) {
                    Some(candidate.user.clone())
                } else {
                    debug!(user_id = %candidate.user.id, "password mismatch");
                    None
                }
            }
            None => {
                let _ = verify_password(password, &self.dummy_hash);
                None
            }
        }
    }

    pub fn find_user_by_id(&self, id: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone())
    }

    pub fn find_client(&self, client_id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    /// Check a confidential client's secret. Unknown clients never verify.
    pub fn verify_client_secret(&self, client_id: &str, secret: &str) -> bool {
        self.find_client(client_id)
            .is_some_and(|client| verify_password(secret, &client.secret_hash))
    }
}
