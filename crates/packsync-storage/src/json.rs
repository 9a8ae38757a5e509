//! One JSON file per document.
//!
//! `["snapshot"]` lives at `<root>/snapshot.json`; nested keys become
//! subdirectories.

use crate::{decode, to_sorted_json, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Documents stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory documents are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file backing `key`.
    pub fn document_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        let Some((last, parents)) = key.split_last() else {
            return Err(StorageError::invalid_key("empty key"));
        };
        if let Some(bad) = key
            .iter()
            .find(|c| c.is_empty() || c.starts_with('.') || c.contains(['/', '\\']))
        {
            return Err(StorageError::invalid_key(format!("bad component '{bad}'")));
        }

        let mut path = self.root.clone();
        path.extend(parents);
        path.push(format!("{last}.json"));
        Ok(path)
    }
}

/// Write `data` to `path` through a sibling temp file that is synced and
/// then renamed over the target.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.{}.tmp", std::process::id()));

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(source) = result {
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "Failed to remove temp file");
            }
        }
        return Err(StorageError::io(path, source));
    }
    Ok(())
}

async fn blocking<T: Send + 'static>(
    path: &Path,
    f: impl FnOnce() -> StorageResult<T> + Send + 'static,
) -> StorageResult<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::io(path, std::io::Error::other(e)))?
}

#[async_trait]
impl Storage for JsonStorage {
    async fn load<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let path = self.document_path(key)?;
        debug!(path = %path.display(), "Loading document");

        let read_path = path.clone();
        let raw = blocking(&path, move || match fs::read_to_string(&read_path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&read_path, e)),
        })
        .await?;

        raw.map(|raw| decode(key, &raw)).transpose()
    }

    async fn store<T: Serialize + Send + Sync>(
        &self,
        key: &[&str],
        value: &T,
    ) -> StorageResult<()> {
        let path = self.document_path(key)?;
        let content = to_sorted_json(key, value)?;
        debug!(path = %path.display(), bytes = content.len(), "Storing document");

        let write_path = path.clone();
        blocking(&path, move || {
            if let Some(parent) = write_path.parent() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
            atomic_write(&write_path, content.as_bytes())
        })
        .await
    }

    async fn contains(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.document_path(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[derive(Serialize)]
    struct Unordered {
        zebra: u8,
        apple: u8,
        mango: u8,
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());
        let doc = Doc {
            name: "Song".to_string(),
            count: 3,
        };

        storage.store(&["projects", "song"], &doc).await.unwrap();

        let loaded: Option<Doc> = storage.load(&["projects", "song"]).await.unwrap();
        assert_eq!(loaded, Some(doc));
        assert!(dir.path().join("projects/song.json").exists());
        assert!(storage.contains(&["projects", "song"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let loaded: Option<Doc> = storage.load(&["snapshot"]).await.unwrap();
        assert_eq!(loaded, None);
        assert!(!storage.contains(&["snapshot"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_corrupt_document() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("snapshot.json"), "{ not json").unwrap();
        let storage = JsonStorage::new(dir.path());

        let err = storage.load::<Doc>(&["snapshot"]).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "snapshot"));
    }

    #[tokio::test]
    async fn test_store_sorts_keys() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage
            .store(
                &["snapshot"],
                &Unordered {
                    zebra: 1,
                    apple: 2,
                    mango: 3,
                },
            )
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("snapshot.json")).unwrap();
        let apple = raw.find("apple").unwrap();
        let mango = raw.find("mango").unwrap();
        let zebra = raw.find("zebra").unwrap();
        assert!(apple < mango && mango < zebra, "keys not sorted: {raw}");
    }

    #[tokio::test]
    async fn test_store_replaces_without_leftovers() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.store(&["snapshot"], &Doc::default()).await.unwrap();
        storage
            .store(
                &["snapshot"],
                &Doc {
                    name: "second".to_string(),
                    count: 2,
                },
            )
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["snapshot.json".to_string()]);

        let loaded: Doc = storage.load(&["snapshot"]).await.unwrap().unwrap();
        assert_eq!(loaded.name, "second");
    }

    #[test]
    fn test_document_path_rejects_escapes() {
        let storage = JsonStorage::new("/data");

        assert!(storage.document_path(&[]).is_err());
        assert!(storage.document_path(&["..", "etc"]).is_err());
        assert!(storage.document_path(&["a/b"]).is_err());
        assert!(storage.document_path(&[""]).is_err());
        assert_eq!(
            storage.document_path(&["snapshot"]).unwrap(),
            PathBuf::from("/data/snapshot.json")
        );
    }
}
