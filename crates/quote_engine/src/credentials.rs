use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use quote_core::ApiKey;
use serde_json::Value;

/// Storage entry holding the generation service key.
pub const API_KEY_ENTRY: &str = "geminiApiKey";

/// Untyped key/value credential storage, as the browser exposes it.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
}

/// Typed view of the stored key: only a non-blank string qualifies.
pub fn load_api_key(store: &dyn CredentialStore) -> Option<ApiKey> {
    match store.get(API_KEY_ENTRY)? {
        Value::String(raw) => ApiKey::new(raw),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(API_KEY_ENTRY, Value::String(api_key.into()));
        store
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{load_api_key, MemoryCredentialStore, API_KEY_ENTRY};

    #[test]
    fn absent_key_is_none() {
        assert!(load_api_key(&MemoryCredentialStore::new()).is_none());
    }

    #[test]
    fn non_string_or_blank_values_are_rejected() {
        let store = MemoryCredentialStore::new();
        store.set(API_KEY_ENTRY, json!(12345));
        assert!(load_api_key(&store).is_none());
        store.set(API_KEY_ENTRY, json!({ "key": "abc" }));
        assert!(load_api_key(&store).is_none());
        store.set(API_KEY_ENTRY, json!("   "));
        assert!(load_api_key(&store).is_none());
    }

    #[test]
    fn string_value_is_loaded() {
        let store = MemoryCredentialStore::with_api_key("abc");
        assert_eq!(load_api_key(&store).unwrap().expose(), "abc");
        store.remove(API_KEY_ENTRY);
        assert!(load_api_key(&store).is_none());
    }
}
