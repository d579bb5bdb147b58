use serde::{Deserialize, Serialize};

/// A stored file record with metadata, encoded content and AI classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub content: ContentPayload,
    pub is_image: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl FileRecord {
    /// Folder this record is filed under, if it has been classified.
    pub fn folder(&self) -> Option<&str> {
        self.classification
            .as_ref()
            .map(|c| c.suggested_folder.as_str())
    }

    pub fn tags(&self) -> &[String] {
        self.classification
            .as_ref()
            .map(|c| c.tags.as_slice())
            .unwrap_or_default()
    }

    /// Case-insensitive substring match against the name and every tag.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .tags()
                .iter()
                .any(|t| t.to_lowercase().contains(&needle))
    }

    pub fn index_entry(&self) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            summary: self.classification.as_ref().map(|c| c.summary.clone()),
            tags: self.classification.as_ref().map(|c| c.tags.clone()),
            folder: self.folder().map(str::to_string),
        }
    }
}

/// File content as captured at ingestion.
///
/// Media and PDFs are kept as base64 data URIs, everything else as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "data", rename_all = "camelCase")]
pub enum ContentPayload {
    Text(String),
    DataUri(String),
}

impl ContentPayload {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::DataUri(s) => s,
        }
    }

    /// The base64 body of a data URI (everything after the first `,`).
    pub fn base64_data(&self) -> Option<&str> {
        match self {
            Self::DataUri(uri) => uri.split_once(',').map(|(_, data)| data),
            Self::Text(_) => None,
        }
    }
}

/// The classification quadruple produced for every ingested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub summary: String,
    pub tags: Vec<String>,
    pub insights: String,
    pub suggested_folder: String,
}

/// A file handed to the hub for ingestion (not yet classified).
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub last_modified: i64,
    pub bytes: Vec<u8>,
}

/// Lightweight projection of a record sent along with semantic searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Which partition of the collection is being looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    Folders,
    Trash,
}

impl ViewMode {
    pub fn shows_deleted(self) -> bool {
        matches!(self, Self::Trash)
    }
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Anything other than `"dark"` reads back as light.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("dark") {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Progress of the most recent ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Analyzing,
    Completed,
    Error,
}
