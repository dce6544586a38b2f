use std::collections::HashMap;
use std::sync::Mutex;

pub const TOKEN_KEY: &str = "oliver_system_token";
pub const REFRESH_TOKEN_KEY: &str = "oliver_system_refresh_token";
pub const USER_KEY: &str = "oliver_system_user";

/// Key/value storage for the session's access and refresh tokens.
///
/// Writes are fire-and-forget from the caller's point of view; a backing
/// store that can fail (a file, a keychain) logs the failure itself.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
    }

    fn set_token(&self, token: &str) {
        self.set(TOKEN_KEY, token);
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn set_refresh_token(&self, token: &str) {
        self.set(REFRESH_TOKEN_KEY, token);
    }

    /// Drop everything this store knows about the session.
    fn clear(&self) {
        self.remove(TOKEN_KEY);
        self.remove(REFRESH_TOKEN_KEY);
        self.remove(USER_KEY);
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}
