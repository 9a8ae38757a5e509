//! Documents held in memory, for tests.

use crate::{decode, to_sorted_json, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-memory documents, encoded exactly as [`crate::JsonStorage`] would
/// write them.
#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `store` fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The stored JSON text for `key`.
    pub fn raw(&self, key: &[&str]) -> Option<String> {
        self.documents().ok()?.get(&key.join("/")).cloned()
    }

    fn documents(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.documents
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let raw = self.documents()?.get(&key.join("/")).cloned();
        raw.map(|raw| decode(key, &raw)).transpose()
    }

    async fn store<T: Serialize + Send + Sync>(
        &self,
        key: &[&str],
        value: &T,
    ) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "writes to '{}' are switched off",
                key.join("/")
            )));
        }
        let json = to_sorted_json(key, value)?;
        self.documents()?.insert(key.join("/"), json);
        Ok(())
    }

    async fn contains(&self, key: &[&str]) -> StorageResult<bool> {
        Ok(self.documents()?.contains_key(&key.join("/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let storage = MemoryStorage::new();
        let doc = Doc {
            name: "Song".to_string(),
            count: 1,
        };

        storage.store(&["snapshot"], &doc).await.unwrap();

        let loaded: Option<Doc> = storage.load(&["snapshot"]).await.unwrap();
        assert_eq!(loaded, Some(doc));
        assert!(storage.contains(&["snapshot"]).await.unwrap());
        assert!(!storage.contains(&["other"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_writes_keeps_previous_document() {
        let storage = MemoryStorage::new();
        storage.store(&["snapshot"], &Doc::default()).await.unwrap();

        storage.set_fail_writes(true);
        let err = storage
            .store(
                &["snapshot"],
                &Doc {
                    name: "lost".to_string(),
                    count: 9,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));

        let kept: Option<Doc> = storage.load(&["snapshot"]).await.unwrap();
        assert_eq!(kept, Some(Doc::default()));

        storage.set_fail_writes(false);
        storage
            .store(
                &["snapshot"],
                &Doc {
                    name: "back".to_string(),
                    count: 2,
                },
            )
            .await
            .unwrap();
        assert!(storage.raw(&["snapshot"]).unwrap().contains("\"back\""));
    }

    #[tokio::test]
    async fn test_raw_is_sorted_json() {
        let storage = MemoryStorage::new();
        storage.store(&["snapshot"], &Doc::default()).await.unwrap();

        let raw = storage.raw(&["snapshot"]).unwrap();
        assert!(raw.find("\"count\"").unwrap() < raw.find("\"name\"").unwrap());
    }
}
