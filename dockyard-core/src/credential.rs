//! Per-user credentials and the lookup contract.
//!
//! The runtime never persists credentials. A credential is looked up per
//! invocation, passed to the execution unit inside the request and dropped
//! when the call completes.

use crate::error::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Opaque key-value bundle scoped to (user id, connector slug).
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(Map<String, Value>);

impl Credential {
    /// Create an empty credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Set a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether the credential holds no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

// Values are secrets; only field names are printed.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("fields", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Boxed future returned by credential lookups.
pub type CredentialFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send + 'a>>;

/// Credential lookup contract consumed by the registry.
///
/// A miss (`Ok(None)`) means the invocation runs with an empty credential.
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for a user and connector.
    fn lookup<'a>(&'a self, user_id: &'a str, slug: &'a str) -> CredentialFuture<'a>;
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<(String, String), Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential (builder style).
    pub fn with_credential(
        self,
        user_id: impl Into<String>,
        slug: impl Into<String>,
        credential: Credential,
    ) -> Self {
        self.insert(user_id, slug, credential);
        self
    }

    /// Add or replace a credential.
    pub fn insert(&self, user_id: impl Into<String>, slug: impl Into<String>, credential: Credential) {
        self.entries
            .write()
            .insert((user_id.into(), slug.into()), credential);
    }

    /// Remove a credential.
    pub fn remove(&self, user_id: &str, slug: &str) -> Option<Credential> {
        self.entries
            .write()
            .remove(&(user_id.to_string(), slug.to_string()))
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn lookup<'a>(&'a self, user_id: &'a str, slug: &'a str) -> CredentialFuture<'a> {
        let found = self
            .entries
            .read()
            .get(&(user_id.to_string(), slug.to_string()))
            .cloned();
        Box::pin(async move { Ok(found) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_is_scoped_by_user_and_slug() {
        let store = MemoryCredentialStore::new().with_credential(
            "user-1",
            "weather",
            Credential::new().with("api_key", "secret"),
        );

        let hit = store.lookup("user-1", "weather").await.unwrap().unwrap();
        assert_eq!(hit.get_str("api_key"), Some("secret"));

        assert!(store.lookup("user-2", "weather").await.unwrap().is_none());
        assert!(store.lookup("user-1", "test_hello").await.unwrap().is_none());
    }

    #[test]
    fn debug_hides_values() {
        let cred = Credential::new().with("api_key", "hunter2");
        let printed = format!("{:?}", cred);
        assert!(printed.contains("api_key"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn remove_and_len() {
        let store = MemoryCredentialStore::new();
        store.insert("u", "s", Credential::new());
        assert_eq!(store.len(), 1);
        assert!(store.remove("u", "s").is_some());
        assert!(store.is_empty());
    }
}
