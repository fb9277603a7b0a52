//! Authorization-code store and code lifecycle.
//!
//! A code is single-use: the first lookup removes it, whatever the outcome.
//! The lookup is one atomic `take`, so two concurrent exchanges of the same
//! code can never both succeed.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::ids::opaque_id;
use crate::models::auth::AuthorizationCode;

/// Authorization code lifetime: 5 minutes.
pub const CODE_TTL_SECS: i64 = 5 * 60;

/// Storage seam for authorization codes.
pub trait AuthorizationCodeStore: Send + Sync {
    fn insert(&self, code: AuthorizationCode);

    /// Atomically remove and return the entry for `code`.
    fn take(&self, code: &str) -> Option<AuthorizationCode>;
}

/// In-memory code store.
#[derive(Default)]
pub struct MemoryCodeStore {
    codes: DashMap<String, AuthorizationCode>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Drop entries that can no longer be redeemed. Returns how many went.
    ///
    /// Only bounds memory: expiry is enforced at consumption regardless.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.codes.len();
        self.codes.retain(|_, entry| !entry.is_expired_at(now));
        before.saturating_sub(self.codes.len())
    }

    /// Spawn a periodic purge task.
    pub fn spawn_cleanup_task(self: &Arc<Self>, every: StdDuration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired(Utc::now());
                if purged > 0 {
                    debug!(purged, "purged expired authorization codes");
                }
            }
        })
    }
}

impl AuthorizationCodeStore for MemoryCodeStore {
    fn insert(&self, code: AuthorizationCode) {
        self.codes.insert(code.code.clone(), code);
    }

    fn take(&self, code: &str) -> Option<AuthorizationCode> {
        self.codes.remove(code).map(|(_, entry)| entry)
    }
}

/// Issue a code bound to (user, client, redirect URI), valid for 5 minutes.
pub fn create_authorization_code(
    store: &dyn AuthorizationCodeStore,
    user_id: &str,
    client_id: &str,
    redirect_uri: &str,
) -> String {
    create_authorization_code_at(store, user_id, client_id, redirect_uri, Utc::now())
}

/// [`create_authorization_code`] with an explicit issuance time.
pub fn create_authorization_code_at(
    store: &dyn AuthorizationCodeStore,
    user_id: &str,
    client_id: &str,
    redirect_uri: &str,
    now: DateTime<Utc>,
) -> String {
    let code = opaque_id();
    store.insert(AuthorizationCode {
        code: code.clone(),
        user_id: user_id.to_string(),
        client_id: client_id.to_string(),
        redirect_uri: redirect_uri.to_string(),
        expires_at: now + Duration::seconds(CODE_TTL_SECS),
    });
    code
}

/// Redeem a code for the given client and redirect URI.
///
/// Returns `None` when the code is unknown, expired, or bound to another
/// client or redirect URI. Callers must not tell these apart.
pub fn consume_authorization_code(
    store: &dyn AuthorizationCodeStore,
    code: &str,
    client_id: &str,
    redirect_uri: &str,
) -> Option<AuthorizationCode> {
    consume_authorization_code_at(store, code, client_id, redirect_uri, Utc::now())
}

/// [`consume_authorization_code`] evaluated at `now`.
pub fn consume_authorization_code_at(
    store: &dyn AuthorizationCodeStore,
    code: &str,
    client_id: &str,
    redirect_uri: &str,
    now: DateTime<Utc>,
) -> Option<AuthorizationCode> {
    // Removed here, before any check: a failed attempt burns the code too.
    let entry = store.take(code)?;

    if entry.is_expired_at(now) {
        debug!(client_id, "authorization code expired");
        return None;
    }

    if entry.client_id != client_id || entry.redirect_uri != redirect_uri {
        debug!(client_id, "authorization code bound to another client or redirect");
        return None;
    }

    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const CLIENT: &str = "eyb-frontend";
    const REDIRECT: &str = "http://localhost:3000/auth/callback";

    #[test]
    fn issued_code_is_a_uuid() {
        let store = MemoryCodeStore::new();
        let code = create_authorization_code(&store, "u1", CLIENT, REDIRECT);
        assert_eq!(code.len(), 36);
        assert!(uuid::Uuid::parse_str(&code).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn consume_returns_binding_once() {
        let store = MemoryCodeStore::new();
        let code = create_authorization_code(&store, "u1", CLIENT, REDIRECT);

        let entry = consume_authorization_code(&store, &code, CLIENT, REDIRECT).expect("valid");
        assert_eq!(entry.user_id, "u1");
        assert_eq!(entry.client_id, CLIENT);
        assert_eq!(entry.redirect_uri, REDIRECT);

        // Second consumption fails even with matching binding.
        assert!(consume_authorization_code(&store, &code, CLIENT, REDIRECT).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_code_fails() {
        let store = MemoryCodeStore::new();
        assert!(consume_authorization_code(&store, "missing", CLIENT, REDIRECT).is_none());
    }

    #[test]
    fn code_expires_after_five_minutes() {
        let store = MemoryCodeStore::new();
        let issued = Utc::now();
        let code = create_authorization_code_at(&store, "u1", CLIENT, REDIRECT, issued);

        let late = issued + Duration::seconds(CODE_TTL_SECS + 1);
        assert!(consume_authorization_code_at(&store, &code, CLIENT, REDIRECT, late).is_none());
        // Expired lookups also remove the entry.
        assert!(store.is_empty());
    }

    #[test]
    fn code_valid_at_exact_expiry() {
        let store = MemoryCodeStore::new();
        let issued = Utc::now();
        let code = create_authorization_code_at(&store, "u1", CLIENT, REDIRECT, issued);

        let edge = issued + Duration::seconds(CODE_TTL_SECS);
        assert!(consume_authorization_code_at(&store, &code, CLIENT, REDIRECT, edge).is_some());
    }

    #[test]
    fn mismatched_binding_fails_and_burns_code() {
        let store = MemoryCodeStore::new();
        let code = create_authorization_code(&store, "u1", CLIENT, REDIRECT);

        assert!(consume_authorization_code(&store, &code, "other-client", REDIRECT).is_none());
        // The legitimate client cannot retry with the burned code.
        assert!(consume_authorization_code(&store, &code, CLIENT, REDIRECT).is_none());

        let code = create_authorization_code(&store, "u1", CLIENT, REDIRECT);
        let variant = format!("{REDIRECT}/");
        assert!(consume_authorization_code(&store, &code, CLIENT, &variant).is_none());
        assert!(consume_authorization_code(&store, &code, CLIENT, REDIRECT).is_none());
    }

    #[test]
    fn concurrent_consumers_get_at_most_one_success() {
        let store = Arc::new(MemoryCodeStore::new());
        let code = create_authorization_code(store.as_ref(), "u1", CLIENT, REDIRECT);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let code = code.clone();
                thread::spawn(move || {
                    consume_authorization_code(store.as_ref(), &code, CLIENT, REDIRECT).is_some()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let store = MemoryCodeStore::new();
        let now = Utc::now();
        let stale = create_authorization_code_at(
            &store,
            "u1",
            CLIENT,
            REDIRECT,
            now - Duration::seconds(CODE_TTL_SECS + 60),
        );
        let fresh = create_authorization_code_at(&store, "u1", CLIENT, REDIRECT, now);

        assert_eq!(store.purge_expired(now), 1);
        assert!(store.take(&stale).is_none());
        assert!(store.take(&fresh).is_some());
    }

    #[tokio::test]
    async fn spawn_cleanup_task_runs() {
        let store = Arc::new(MemoryCodeStore::new());
        create_authorization_code_at(
            store.as_ref(),
            "u1",
            CLIENT,
            REDIRECT,
            Utc::now() - Duration::seconds(CODE_TTL_SECS + 60),
        );
        let handle = store.spawn_cleanup_task(StdDuration::from_millis(10));
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        handle.abort();
        assert!(store.is_empty());
    }
}
