//! Token persistence across a durable and an ephemeral backend.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::Token;
use crate::utils::{now_millis, remaining_secs};

use super::storage::{MemoryStorage, StorageBackend};

pub const TOKEN_KEY: &str = "auth_token";
pub const EXPIRY_KEY: &str = "auth_token_expires";
pub const REFRESH_TOKEN_KEY: &str = "auth_refresh_token";

const ALL_KEYS: [&str; 3] = [TOKEN_KEY, EXPIRY_KEY, REFRESH_TOKEN_KEY];

/// Persists the access token in exactly one of two backends.
///
/// Reads check the durable backend first, then the ephemeral one.
/// Clone is cheap; clones share the same backends.
#[derive(Clone)]
pub struct TokenStore {
    durable: Arc<dyn StorageBackend>,
    ephemeral: Arc<dyn StorageBackend>,
}

impl TokenStore {
    pub fn new(durable: Arc<dyn StorageBackend>, ephemeral: Arc<dyn StorageBackend>) -> Self {
        Self { durable, ephemeral }
    }

    /// Both backends in memory. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// Save the token to the durable backend if `remember_me`, else the
    /// ephemeral one. The other backend is left untouched.
    pub fn save(&self, token: &Token, remember_me: bool) -> Result<()> {
        self.save_at(token, remember_me, now_millis())
    }

    fn save_at(&self, token: &Token, remember_me: bool, now_ms: i64) -> Result<()> {
        let storage = if remember_me { &self.durable } else { &self.ephemeral };
        let expiry = now_ms.saturating_add(token.lifetime_ms());

        storage.set_item(TOKEN_KEY, &token.access_token)?;
        storage.set_item(EXPIRY_KEY, &expiry.to_string())?;
        if let Some(ref refresh) = token.refresh_token {
            storage.set_item(REFRESH_TOKEN_KEY, refresh)?;
        }

        debug!(backend = storage.name(), expiry, "Token saved");
        Ok(())
    }

    pub fn get(&self) -> Option<String> {
        self.lookup(TOKEN_KEY)
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.lookup(REFRESH_TOKEN_KEY)
    }

    /// Expiry in epoch milliseconds. An unparseable value counts as absent.
    pub fn get_expiry(&self) -> Option<i64> {
        let raw = self.lookup(EXPIRY_KEY)?;
        match raw.trim().parse::<i64>() {
            Ok(expiry) => Some(expiry),
            Err(_) => {
                warn!(value = %raw, "Ignoring malformed token expiry");
                None
            }
        }
    }

    /// True when no expiry is stored or the expiry has been reached.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.get_expiry() {
            Some(expiry) => now_ms >= expiry,
            None => true,
        }
    }

    /// Seconds left before the stored token expires, 0 if unknown or past.
    pub fn remaining_secs(&self) -> i64 {
        self.get_expiry()
            .map(|expiry| remaining_secs(expiry, now_millis()))
            .unwrap_or(0)
    }

    /// Remove every auth key from both backends. Safe to call repeatedly.
    pub fn clear(&self) {
        for storage in [&self.durable, &self.ephemeral] {
            for key in ALL_KEYS {
                if let Err(e) = storage.remove_item(key) {
                    warn!(backend = storage.name(), key, error = %e, "Failed to clear stored key");
                }
            }
        }
        debug!("Token storage cleared");
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.durable
            .get_item(key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.ephemeral.get_item(key).filter(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_token;

    fn store_with_backends() -> (TokenStore, Arc<MemoryStorage>, Arc<MemoryStorage>) {
        let durable = Arc::new(MemoryStorage::new());
        let ephemeral = Arc::new(MemoryStorage::new());
        let store = TokenStore::new(durable.clone(), ephemeral.clone());
        (store, durable, ephemeral)
    }

    #[test]
    fn test_save_remember_me_uses_durable_only() {
        let (store, durable, ephemeral) = store_with_backends();
        store.save(&sample_token("abc", 3600), true).unwrap();

        assert_eq!(store.get().as_deref(), Some("abc"));
        assert_eq!(durable.get_item(TOKEN_KEY).as_deref(), Some("abc"));
        assert!(ephemeral.get_item(TOKEN_KEY).is_none());
        assert_eq!(durable.get_item(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-abc"));
    }

    #[test]
    fn test_save_without_remember_me_uses_ephemeral_only() {
        let (store, durable, ephemeral) = store_with_backends();
        store.save(&sample_token("abc", 3600), false).unwrap();

        assert_eq!(store.get().as_deref(), Some("abc"));
        assert!(durable.is_empty());
        assert_eq!(ephemeral.get_item(TOKEN_KEY).as_deref(), Some("abc"));
    }

    #[test]
    fn test_save_without_refresh_token() {
        let (store, _durable, ephemeral) = store_with_backends();
        let mut token = sample_token("abc", 60);
        token.refresh_token = None;
        store.save(&token, false).unwrap();

        assert!(ephemeral.get_item(REFRESH_TOKEN_KEY).is_none());
        assert!(store.get_refresh_token().is_none());
    }

    #[test]
    fn test_save_computes_expiry() {
        let (store, _, _) = store_with_backends();
        store.save_at(&sample_token("abc", 3600), true, 1_000).unwrap();
        assert_eq!(store.get_expiry(), Some(3_601_000));
    }

    #[test]
    fn test_get_prefers_durable() {
        let (store, durable, ephemeral) = store_with_backends();
        ephemeral.set_item(TOKEN_KEY, "session-token").unwrap();
        durable.set_item(TOKEN_KEY, "local-token").unwrap();
        assert_eq!(store.get().as_deref(), Some("local-token"));
    }

    #[test]
    fn test_get_absent() {
        let (store, _, _) = store_with_backends();
        assert!(store.get().is_none());
        assert!(store.get_expiry().is_none());
    }

    #[test]
    fn test_clear_purges_both_backends() {
        let (store, durable, ephemeral) = store_with_backends();
        store.save(&sample_token("first", 3600), true).unwrap();
        store.save(&sample_token("second", 3600), false).unwrap();

        store.clear();
        assert!(store.get().is_none());
        assert!(durable.is_empty());
        assert!(ephemeral.is_empty());

        // Idempotent
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_is_expired_without_expiry() {
        let (store, durable, _) = store_with_backends();
        assert!(store.is_expired());

        // Token present but no expiry still counts as expired
        durable.set_item(TOKEN_KEY, "abc").unwrap();
        assert!(store.is_expired());
    }

    #[test]
    fn test_is_expired_boundary() {
        let (store, durable, _) = store_with_backends();
        durable.set_item(EXPIRY_KEY, "5000").unwrap();

        assert!(!store.is_expired_at(4_999));
        assert!(store.is_expired_at(5_000));
        assert!(store.is_expired_at(5_001));
    }

    #[test]
    fn test_malformed_expiry_is_expired() {
        let (store, _, ephemeral) = store_with_backends();
        ephemeral.set_item(EXPIRY_KEY, "tomorrow").unwrap();
        assert!(store.get_expiry().is_none());
        assert!(store.is_expired());
    }

    #[test]
    fn test_fresh_token_not_expired() {
        let (store, _, _) = store_with_backends();
        store.save(&sample_token("abc", 3600), false).unwrap();
        assert!(!store.is_expired());
        let remaining = store.remaining_secs();
        assert!(remaining > 3590 && remaining <= 3600);
    }

    #[test]
    fn test_file_backed_durable_storage() {
        use crate::auth::FileStorage;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = TokenStore::new(
            Arc::new(FileStorage::new(path.clone())),
            Arc::new(MemoryStorage::new()),
        );
        store.save(&sample_token("abc", 3600), true).unwrap();

        // A new process only sees the durable backend
        let reopened = TokenStore::new(Arc::new(FileStorage::new(path)), Arc::new(MemoryStorage::new()));
        assert_eq!(reopened.get().as_deref(), Some("abc"));
        assert!(!reopened.is_expired());
    }
}
