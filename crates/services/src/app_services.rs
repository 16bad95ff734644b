use std::sync::Arc;

use lesson_core::model::{Catalog, GameRules};
use storage::{ProgressStore, Storage};

use crate::catalog_source::{CatalogSource, load_catalog};
use crate::error::AppServicesError;
use crate::sessions::GameLoopService;

/// Assembles the catalog, the progress store and the game rules.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    store: ProgressStore,
    rules: GameRules,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog loading
    /// fails.
    pub async fn new_sqlite(
        db_url: &str,
        source: &dyn CatalogSource,
        rules: GameRules,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let catalog = load_catalog(source).await?;
        Ok(Self::from_parts(catalog, &storage, rules))
    }

    /// Build services backed by in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` if the catalog cannot be loaded.
    pub async fn new_in_memory(
        source: &dyn CatalogSource,
        rules: GameRules,
    ) -> Result<Self, AppServicesError> {
        let catalog = load_catalog(source).await?;
        Ok(Self::from_parts(catalog, &Storage::in_memory(), rules))
    }

    #[must_use]
    pub fn from_parts(catalog: Catalog, storage: &Storage, rules: GameRules) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store: ProgressStore::new(Arc::clone(&storage.progress)),
            rules,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn rules(&self) -> GameRules {
        self.rules
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Load stored progress and open a game at the skill map.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Session` if progress cannot be read.
    pub async fn start_game(&self) -> Result<GameLoopService, AppServicesError> {
        Ok(GameLoopService::start(self.catalog(), self.rules, self.store.clone()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_source::StaticCatalogSource;
    use crate::error::{CatalogLoadError, SessionError};
    use async_trait::async_trait;
    use storage::{ProgressRepository, StorageError};

    struct UnreadableRepository;

    #[async_trait]
    impl ProgressRepository for UnreadableRepository {
        async fn load_slot(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("locked".into()))
        }

        async fn save_slot(&self, _key: &str, _blob: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn bootstrap_errors_keep_their_origin() {
        let Err(err) =
            AppServices::new_in_memory(&StaticCatalogSource::new("{"), GameRules::standard()).await
        else {
            panic!("malformed catalog accepted");
        };
        assert!(matches!(err, AppServicesError::Catalog(CatalogLoadError::Parse(_))));

        let doc = include_str!("../../../demos/lessons.json");
        let catalog = crate::parse_catalog(doc).unwrap();
        let storage = Storage {
            progress: Arc::new(UnreadableRepository),
        };
        let app = AppServices::from_parts(catalog, &storage, GameRules::standard());
        let err = app.start_game().await.unwrap_err();
        assert!(matches!(
            err,
            AppServicesError::Session(SessionError::Storage(StorageError::Connection(_)))
        ));
    }
}
