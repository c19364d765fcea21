use std::sync::{PoisonError, RwLock};

use super::{TokenPair, TokenStore};

#[derive(Debug, Default)]
struct Slots {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Keeps tokens for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<Slots>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let store = Self::new();
        TokenPair {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
        }
        .store_in(&store);
        store
    }
}

impl TokenStore for MemoryStore {
    fn access_token(&self) -> Option<String> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).refresh_token.clone()
    }

    fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.access_token = Some(access_token);
        if let Some(refresh_token) = refresh_token {
            slots.refresh_token = Some(refresh_token);
        }
    }

    fn clear_tokens(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.access_token = None;
        slots.refresh_token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_kept_when_not_rotated() {
        let store = MemoryStore::with_tokens("A1", "R1");
        store.set_tokens("A2".to_string(), None);
        assert_eq!(store.access_token().as_deref(), Some("A2"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));

        store.set_tokens("A3".to_string(), Some("R2".to_string()));
        assert_eq!(store.refresh_token().as_deref(), Some("R2"));
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::with_tokens("A1", "R1");
        store.clear_tokens();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }
}
