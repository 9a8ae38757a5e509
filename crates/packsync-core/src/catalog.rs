//! Catalog persistence.

use crate::error::CoreResult;
use crate::model::Catalog;
use async_trait::async_trait;
use packsync_storage::Storage;
use tracing::debug;

/// Storage key of the catalog document (`snapshot.json` on disk).
pub const CATALOG_KEY: &[&str] = &["snapshot"];

/// Loads and saves the whole catalog.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the catalog, or an empty one if nothing has been saved yet.
    async fn load(&self) -> CoreResult<Catalog>;

    /// Replace the saved catalog.
    async fn save(&self, catalog: &Catalog) -> CoreResult<()>;
}

/// [`Persistence`] over any keyed [`Storage`] backend.
pub struct CatalogStore<S> {
    storage: S,
}

impl<S: Storage> CatalogStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[async_trait]
impl<S: Storage> Persistence for CatalogStore<S> {
    async fn load(&self) -> CoreResult<Catalog> {
        let catalog: Catalog = self.storage.load(CATALOG_KEY).await?.unwrap_or_default();
        debug!(
            projects = catalog.projects.len(),
            events = catalog.activity.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    async fn save(&self, catalog: &Catalog) -> CoreResult<()> {
        self.storage.store(CATALOG_KEY, catalog).await?;
        debug!(projects = catalog.projects.len(), "Saved catalog");
        Ok(())
    }
}
