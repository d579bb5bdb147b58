//! The hub facade: collection, classifier, resolver and persistence wired together.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::classify::Classifier;
use super::collection::FileCollection;
use super::connectivity::ConnectivitySignal;
use super::provider::AiProvider;
use super::schema::{AnalysisStatus, FileRecord, RawFile, Theme, ViewMode};
use super::search::SearchResolver;
use super::store::{LocalStore, COLLECTION_KEY, CORRUPT_COLLECTION_KEY, THEME_KEY};
use crate::config::Config;

/// Tracing target for hub operations.
pub const TRACING_TARGET: &str = "exfile::hub";

/// Owns the file collection and persists it after every mutation.
#[derive(Debug)]
pub struct FileHub {
    collection: FileCollection,
    store: LocalStore,
    classifier: Classifier,
    resolver: SearchResolver,
    connectivity: ConnectivitySignal,
    status: AnalysisStatus,
    theme: Theme,
}

impl FileHub {
    /// Open the hub described by `config`.
    pub fn open(config: &Config, connectivity: ConnectivitySignal) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let store = LocalStore::open(&data_dir)?;
        let provider = config.ai.provider()?;
        let classifier = Classifier::new(provider.clone()).with_timeout(config.ai.timeout());
        Self::with_parts(store, classifier, SearchResolver::new(provider), connectivity)
    }

    /// Build a hub over an existing store with a single provider for both
    /// classification and search.
    pub fn new(
        store: LocalStore,
        provider: Option<Arc<dyn AiProvider>>,
        connectivity: ConnectivitySignal,
    ) -> Result<Self> {
        Self::with_parts(
            store,
            Classifier::new(provider.clone()),
            SearchResolver::new(provider),
            connectivity,
        )
    }

    pub fn with_parts(
        store: LocalStore,
        classifier: Classifier,
        resolver: SearchResolver,
        connectivity: ConnectivitySignal,
    ) -> Result<Self> {
        let collection = match store.get(COLLECTION_KEY)? {
            Some(json) => match FileCollection::from_json(&json) {
                Ok(collection) => collection,
                Err(err) => {
                    // Keep the unreadable blob; the next save overwrites COLLECTION_KEY.
                    store
                        .set(CORRUPT_COLLECTION_KEY, &json)
                        .context("Failed to preserve unreadable collection")?;
                    tracing::warn!(
                        target: TRACING_TARGET,
                        error = %err,
                        backup = CORRUPT_COLLECTION_KEY,
                        "Stored collection is unreadable, starting empty"
                    );
                    FileCollection::new()
                }
            },
            None => FileCollection::new(),
        };
        let theme = store
            .get(THEME_KEY)?
            .map(|t| Theme::parse(&t))
            .unwrap_or_default();

        tracing::debug!(target: TRACING_TARGET, files = collection.len(), theme = theme.as_str(), "Hub loaded");
        Ok(Self {
            collection,
            store,
            classifier,
            resolver,
            connectivity,
            status: AnalysisStatus::Idle,
            theme,
        })
    }

    pub fn collection(&self) -> &FileCollection {
        &self.collection
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.connectivity
    }

    pub fn resolver(&self) -> &SearchResolver {
        &self.resolver
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    /// Ingest a batch, then re-serialize the whole collection.
    pub async fn upload(&mut self, raw_files: Vec<RawFile>) -> Result<Vec<FileRecord>> {
        if raw_files.is_empty() {
            return Ok(Vec::new());
        }
        self.status = AnalysisStatus::Analyzing;
        let connectivity = self.connectivity.get();
        tracing::info!(target: TRACING_TARGET, files = raw_files.len(), ?connectivity, "Analyzing upload");

        let added = self
            .collection
            .ingest(raw_files, &self.classifier, connectivity)
            .await;

        match self.save() {
            Ok(()) => {
                self.status = AnalysisStatus::Completed;
                Ok(added)
            }
            Err(err) => {
                self.status = AnalysisStatus::Error;
                Err(err)
            }
        }
    }

    /// Move a file to or from the trash. Unknown ids are a no-op.
    pub fn toggle_trash(&mut self, id: &str) -> Result<bool> {
        let changed = self.collection.toggle_trash(id);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// Remove a file for good. Unknown ids are a no-op.
    pub fn delete_forever(&mut self, id: &str) -> Result<bool> {
        let changed = self.collection.delete_forever(id);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// Feed a new query to the resolver and return what can be shown right now.
    pub fn search(&self, query: &str, mode: ViewMode) -> Vec<&FileRecord> {
        self.resolver.submit(
            query,
            self.collection.index_entries(mode),
            self.connectivity.get(),
        );
        self.visible(query, mode)
    }

    /// Files in `mode` that pass the current filter for `query`.
    pub fn visible(&self, query: &str, mode: ViewMode) -> Vec<&FileRecord> {
        self.resolver.filter(query, self.collection.view(mode))
    }

    pub fn folders(&self, mode: ViewMode) -> Vec<String> {
        self.collection.folders(mode)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    fn save(&self) -> Result<()> {
        let json = self
            .collection
            .to_json()
            .context("Failed to serialize file collection")?;
        self.store.set(COLLECTION_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::provider::MockProvider;

    fn raw(name: &str) -> RawFile {
        RawFile {
            name: name.into(),
            size_bytes: 1,
            mime_type: String::new(),
            last_modified: 0,
            bytes: vec![b'x'],
        }
    }

    fn offline_hub(store: LocalStore) -> FileHub {
        FileHub::new(store, None, ConnectivitySignal::new(false)).unwrap()
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let store = LocalStore::in_memory().unwrap();
        let mut hub = offline_hub(store.clone());

        let added = hub.upload(vec![raw("a.txt"), raw("b.png")]).await.unwrap();
        assert_eq!(hub.status(), AnalysisStatus::Completed);
        let saved = || FileCollection::from_json(&store.get(COLLECTION_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved().len(), 2);

        hub.toggle_trash(&added[0].id).unwrap();
        assert!(saved().get(&added[0].id).unwrap().is_deleted);

        hub.delete_forever(&added[0].id).unwrap();
        assert!(saved().get(&added[0].id).is_none());
        assert_eq!(&saved(), hub.collection());
    }

    #[tokio::test]
    async fn reload_restores_collection_and_theme() {
        let store = LocalStore::in_memory().unwrap();
        {
            let mut hub = offline_hub(store.clone());
            hub.upload(vec![raw("a.txt")]).await.unwrap();
            assert_eq!(hub.toggle_theme().unwrap(), Theme::Dark);
        }
        let hub = offline_hub(store);
        assert_eq!(hub.collection().len(), 1);
        assert_eq!(hub.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn corrupt_state_starts_empty() {
        let store = LocalStore::in_memory().unwrap();
        store.set(COLLECTION_KEY, "{not json").unwrap();
        let hub = offline_hub(store);
        assert!(hub.collection().is_empty());
    }

    #[tokio::test]
    async fn unreadable_collection_survives_next_save() {
        // Valid JSON, but the classification lacks required fields.
        let blob = r#"[{"id":"x","name":"a.txt","sizeBytes":1,"mimeType":"text/plain","lastModified":0,"content":{"encoding":"text","data":"x"},"isImage":false,"classification":{"summary":"s"}}]"#;
        let store = LocalStore::in_memory().unwrap();
        store.set(COLLECTION_KEY, blob).unwrap();

        let mut hub = offline_hub(store.clone());
        assert!(hub.collection().is_empty());
        hub.upload(vec![raw("b.txt")]).await.unwrap();

        assert_eq!(store.get(CORRUPT_COLLECTION_KEY).unwrap().as_deref(), Some(blob));
        assert_eq!(hub.collection().len(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_do_not_touch_store() {
        let store = LocalStore::in_memory().unwrap();
        let mut hub = offline_hub(store.clone());
        assert!(!hub.toggle_trash("nope").unwrap());
        assert!(!hub.delete_forever("nope").unwrap());
        assert_eq!(store.get(COLLECTION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn connectivity_is_read_at_call_time() {
        let mock = MockProvider::classifying(Default::default());
        let signal = ConnectivitySignal::new(false);
        let mut hub = FileHub::new(
            LocalStore::in_memory().unwrap(),
            Some(Arc::new(mock.clone())),
            signal.clone(),
        )
        .unwrap();

        hub.upload(vec![raw("a.txt")]).await.unwrap();
        assert!(mock.classify_calls().is_empty());

        signal.set_online(true);
        let added = hub.upload(vec![raw("b.txt")]).await.unwrap();
        assert_eq!(mock.classify_calls().len(), 1);
        assert_eq!(added[0].folder(), Some("Manual Review"));
    }

    #[tokio::test]
    async fn search_scopes_to_view() {
        let mut hub = offline_hub(LocalStore::in_memory().unwrap());
        let added = hub.upload(vec![raw("invoice.txt"), raw("invoice-old.txt")]).await.unwrap();
        hub.toggle_trash(&added[1].id).unwrap();

        let grid = hub.search("invoice", ViewMode::Grid);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].id, added[0].id);
        let trash = hub.visible("invoice", ViewMode::Trash);
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].id, added[1].id);
    }
}
