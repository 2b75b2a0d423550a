// ── Credential storage seam ──
//
// Dashboard link, TLS flag, username, password and API key live behind
// an opaque key-value store so the interactive CLI and the one-shot
// snapshot path read the same values. `komari-config` provides the
// OS-keyring implementation.

use dashmap::DashMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::CoreError;

/// The fixed set of keys a credential store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CredentialKey {
    Link,
    Ssl,
    Username,
    Password,
    ApiKey,
}

/// Opaque key-value storage for dashboard credentials.
pub trait CredentialStore: Send + Sync {
    /// Read a value; absent and unreadable entries are both `None`.
    fn get(&self, key: CredentialKey) -> Option<String>;

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CoreError>;

    fn remove(&self, key: CredentialKey) -> Result<(), CoreError>;
}

/// In-process store, used by tests and by callers that never persist.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: DashMap<CredentialKey, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.values.get(&key).map(|v| v.value().clone())
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CoreError> {
        self.values.insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: CredentialKey) -> Result<(), CoreError> {
        self.values.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        assert!(store.get(CredentialKey::Link).is_none());

        store.set(CredentialKey::Link, "example.com").unwrap();
        assert_eq!(store.get(CredentialKey::Link).as_deref(), Some("example.com"));

        store.remove(CredentialKey::Link).unwrap();
        assert!(store.get(CredentialKey::Link).is_none());
    }

    #[test]
    fn key_names_are_snake_case() {
        assert_eq!(CredentialKey::ApiKey.as_ref(), "api_key");
        assert_eq!("password".parse::<CredentialKey>().unwrap(), CredentialKey::Password);
    }
}
