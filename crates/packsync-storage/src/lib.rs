//! Keyed JSON documents for packsync.
//!
//! The catalog of projects and activity is one document. Two backends
//! implement [`Storage`]:
//! - [`JsonStorage`] keeps each document in its own file and replaces it
//!   atomically.
//! - [`MemoryStorage`] keeps documents in memory and can be told to fail.

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// A backend holding JSON documents under path-like keys such as
/// `["snapshot"]`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load a document, or `None` when nothing is stored under `key`.
    async fn load<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>>;

    /// Replace the document under `key`. Readers see either the old or the
    /// new document, never a mix.
    async fn store<T: Serialize + Send + Sync>(&self, key: &[&str], value: &T)
        -> StorageResult<()>;

    /// Whether a document is stored under `key`.
    async fn contains(&self, key: &[&str]) -> StorageResult<bool>;
}

/// Encode a value as pretty JSON with object keys sorted.
///
/// Going through `serde_json::Value` reorders struct fields into the map's
/// key order, so equal values always produce identical documents.
pub fn to_sorted_json<T: Serialize + ?Sized>(key: &[&str], value: &T) -> StorageResult<String> {
    let encode = |source| StorageError::Encode {
        key: key.join("/"),
        source,
    };
    let value = serde_json::to_value(value).map_err(encode)?;
    serde_json::to_string_pretty(&value).map_err(encode)
}

pub(crate) fn decode<T: DeserializeOwned>(key: &[&str], raw: &str) -> StorageResult<T> {
    serde_json::from_str(raw).map_err(|source| StorageError::Corrupt {
        key: key.join("/"),
        source,
    })
}
