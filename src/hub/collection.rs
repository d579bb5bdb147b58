use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classify::Classifier;
use super::connectivity::Connectivity;
use super::extract::{encode_payload, guess_mime_type, is_image_mime};
use super::schema::{FileRecord, IndexEntry, RawFile, ViewMode};

/// Tracing target for collection mutations.
pub const TRACING_TARGET: &str = "exfile::collection";

/// Folder shown for records that have no classification.
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

/// The authoritative, ordered set of file records.
///
/// Records are only created by [`ingest`](Self::ingest), only changed by
/// [`toggle_trash`](Self::toggle_trash) and only removed by
/// [`delete_forever`](Self::delete_forever).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCollection {
    files: Vec<FileRecord>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Build, classify and append one record per input, in input order.
    /// Classification cannot fail; a remote problem only degrades the label set.
    pub async fn ingest(
        &mut self,
        raw_files: Vec<RawFile>,
        classifier: &Classifier,
        connectivity: Connectivity,
    ) -> Vec<FileRecord> {
        let mut added = Vec::with_capacity(raw_files.len());
        for raw in raw_files {
            let mut record = self.synthesize(raw);
            record.classification = Some(classifier.classify(&record, connectivity).await);
            tracing::info!(
                target: TRACING_TARGET,
                id = %record.id,
                file = %record.name,
                folder = record.folder().unwrap_or_default(),
                "Ingested file"
            );
            self.files.push(record.clone());
            added.push(record);
        }
        added
    }

    fn synthesize(&self, raw: RawFile) -> FileRecord {
        let mime_type = if raw.mime_type.trim().is_empty() {
            guess_mime_type(&raw.name)
        } else {
            raw.mime_type
        };
        FileRecord {
            id: self.fresh_id(),
            content: encode_payload(&raw.bytes, &mime_type),
            is_image: is_image_mime(&mime_type),
            name: raw.name,
            size_bytes: raw.size_bytes,
            mime_type,
            last_modified: raw.last_modified,
            is_deleted: false,
            classification: None,
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Flip the soft-delete flag. Returns false when the id is unknown.
    pub fn toggle_trash(&mut self, id: &str) -> bool {
        match self.files.iter_mut().find(|f| f.id == id) {
            Some(file) => {
                file.is_deleted = !file.is_deleted;
                tracing::info!(target: TRACING_TARGET, id, deleted = file.is_deleted, "Toggled trash");
                true
            }
            None => false,
        }
    }

    /// Remove a record for good. Returns false when the id is unknown.
    pub fn delete_forever(&mut self, id: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != id);
        let removed = self.files.len() != before;
        if removed {
            tracing::info!(target: TRACING_TARGET, id, "Deleted file permanently");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter()
    }

    pub fn active_view(&self) -> Vec<&FileRecord> {
        self.files.iter().filter(|f| !f.is_deleted).collect()
    }

    pub fn trash_view(&self) -> Vec<&FileRecord> {
        self.files.iter().filter(|f| f.is_deleted).collect()
    }

    pub fn view(&self, mode: ViewMode) -> Vec<&FileRecord> {
        if mode.shows_deleted() {
            self.trash_view()
        } else {
            self.active_view()
        }
    }

    /// Distinct folders of the records in `mode`, in order of first appearance.
    pub fn folders(&self, mode: ViewMode) -> Vec<String> {
        let mut folders: Vec<String> = Vec::new();
        for file in self.view(mode) {
            let folder = file.folder().unwrap_or(UNCATEGORIZED_FOLDER);
            if !folders.iter().any(|f| f == folder) {
                folders.push(folder.to_string());
            }
        }
        folders
    }

    pub fn index_entries(&self, mode: ViewMode) -> Vec<IndexEntry> {
        self.view(mode).into_iter().map(FileRecord::index_entry).collect()
    }
}
