//! Session store (`sid` → user).
//!
//! Sessions live for the lifetime of the store; nothing expires or destroys
//! them.

use chrono::Utc;
use dashmap::DashMap;

use crate::ids::opaque_id;
use crate::models::auth::Session;

/// Storage seam for login sessions.
pub trait SessionStore: Send + Sync {
    /// Record a session for `user_id` and return its fresh `sid`. Cannot fail.
    fn create_session(&self, user_id: &str) -> String;

    fn find_session(&self, sid: &str) -> Option<Session>;
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn create_session(&self, user_id: &str) -> String {
        let sid = opaque_id();
        self.sessions.insert(
            sid.clone(),
            Session {
                sid: sid.clone(),
                user_id: user_id.to_string(),
                created_at: Utc::now(),
            },
        );
        sid
    }

    fn find_session(&self, sid: &str) -> Option<Session> {
        self.sessions.get(sid).map(|entry| entry.value().clone())
    }
}
