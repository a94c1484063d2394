//! Key-value persistence for the gate, throttle, and history.
//!
//! Everything the service remembers lives under three keys in a single
//! storage scope. Reads are forgiving: a missing key, an unreadable backend,
//! or a corrupt JSON value all come back as "absent" so callers can fall back
//! to a fresh state instead of failing the request.

pub mod file;
pub mod memory;
pub mod redis_store;

use std::sync::Arc;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, StorageBackend};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Storage key for the payment entitlement grant.
pub const ENTITLEMENT_KEY: &str = "cover_letter_app_paid";
/// Storage key for the rate-limit window.
pub const THROTTLE_KEY: &str = "cover_letter_rate_limit";
/// Storage key for the generation history list.
pub const HISTORY_KEY: &str = "cover_letter_history";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Synchronous string-valued key-value store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and deserializes `key`. Any failure is logged and reported as `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read '{key}' from storage, treating as absent: {e}");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Corrupt value under '{key}', treating as absent: {e}");
            None
        }
    }
}

/// Serializes `value` and writes it under `key`.
pub fn write_json<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Opens the backend selected by configuration.
pub fn connect(config: &Config) -> Result<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match &config.storage_backend {
        StorageBackend::Redis(url) => {
            info!("Connecting to Redis...");
            Arc::new(RedisStore::open(url)?)
        }
        StorageBackend::File(dir) => {
            info!("Using file storage at {}", dir.display());
            Arc::new(FileStore::open(dir)?)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; state is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
    }

    /// Store whose reads always fail.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn test_read_json_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(read_json::<Sample>(&store, "nope"), None);
    }

    #[test]
    fn test_read_json_corrupt_value_is_none() {
        let store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert_eq!(read_json::<Sample>(&store, "k"), None);
    }

    #[test]
    fn test_read_json_backend_failure_is_none() {
        assert_eq!(read_json::<Sample>(&BrokenStore, "k"), None);
    }

    #[test]
    fn test_write_then_read_json() {
        let store = MemoryStore::new();
        write_json(&store, "k", &Sample { count: 3 }).unwrap();
        assert_eq!(read_json::<Sample>(&store, "k"), Some(Sample { count: 3 }));
    }

    #[test]
    fn test_write_json_surfaces_backend_failure() {
        let result = write_json(&BrokenStore, "k", &Sample { count: 1 });
        assert!(matches!(result, Err(StorageError::Poisoned)));
    }
}
