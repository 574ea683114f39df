use crate::safe_nanoid;
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use std::time::Duration;
use tracing::debug;
use vpms_domain::config::SessionConfig;

const TOKEN_LENGTH: usize = 32;

/// Server-side state behind one session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    /// Dashboard filter typed by the user, kept until cleared or logout.
    pub search_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Bounded, expiring map from session token to [`Session`].
///
/// Entries live for the configured TTL from login. Capacity is bounded.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cache: Cache<String, Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds.max(1)))
            .build();
        Self { cache }
    }

    /// Opens a session and returns its freshly generated token.
    pub fn create(&self, user_id: impl Into<String>) -> String {
        let token = safe_nanoid!(TOKEN_LENGTH);
        let session = Session {
            user_id: user_id.into(),
            search_location: None,
            created_at: Utc::now(),
        };
        debug!(user_id = %session.user_id, "Session created");
        self.cache.insert(token.clone(), session);
        token
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<Session> {
        self.cache.get(token)
    }

    /// Replaces the dashboard search filter. Returns `false` if the session is gone.
    pub fn set_search_location(&self, token: &str, location: Option<String>) -> bool {
        let Some(mut session) = self.cache.get(token) else {
            return false;
        };
        session.search_location = location;
        self.cache.insert(token.to_owned(), session);
        true
    }

    pub fn destroy(&self, token: &str) {
        self.cache.invalidate(token);
    }

    /// Ends every session of `user_id` (account deletion, forced logout).
    /// Returns how many sessions were dropped.
    pub fn destroy_user(&self, user_id: &str) -> usize {
        let tokens: Vec<_> = self
            .cache
            .iter()
            .filter(|(_, session)| session.user_id == user_id)
            .map(|(token, _)| token)
            .collect();
        for token in &tokens {
            self.cache.invalidate(token.as_str());
        }
        tokens.len()
    }
}
