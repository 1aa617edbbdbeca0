// Stockroom - Session registry
// Bearer tokens live in process memory only. A restart logs everyone out,
// which is acceptable for a single-instance deployment.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::api::UserInfo;

/// Token to account mapping shared across request handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, UserInfo>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for an authenticated account.
    pub fn issue(&self, user: UserInfo) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap()
            .insert(token.clone(), user);
        token
    }

    /// Look up the account behind a token, if the session is still live.
    pub fn resolve(&self, token: &str) -> Option<UserInfo> {
        self.sessions.read().unwrap().get(token).cloned()
    }

    /// Drop a session. Returns false when the token was already gone.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.write().unwrap().remove(token).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Role;

    fn sample_user(username: &str) -> UserInfo {
        UserInfo {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            role: Role::Maintenance,
        }
    }

    #[test]
    fn issued_token_resolves_to_its_user() {
        let store = SessionStore::new();
        let token = store.issue(sample_user("petro"));

        let resolved = store.resolve(&token).unwrap();
        assert_eq!(resolved.username, "petro");
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let store = SessionStore::new();
        assert_eq!(store.resolve("no-such-token"), None);
    }

    #[test]
    fn revoke_removes_exactly_one_session() {
        let store = SessionStore::new();
        let first = store.issue(sample_user("petro"));
        let second = store.issue(sample_user("olena"));

        assert!(store.revoke(&first));
        assert!(!store.revoke(&first));
        assert_eq!(store.resolve(&first), None);
        assert!(store.resolve(&second).is_some());
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn clones_share_the_same_sessions() {
        let store = SessionStore::new();
        let clone = store.clone();
        let token = store.issue(sample_user("petro"));

        assert!(clone.resolve(&token).is_some());
    }
}
