//! Remote AI capability used for classification and semantic search.
//!
//! The hub only depends on [`AiProvider`]; [`GeminiProvider`] talks to the
//! Gemini `generateContent` API and [`MockProvider`] scripts answers for tests.

mod error;
mod gemini;
#[cfg(any(test, feature = "test-utils"))]
mod mock;

pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use gemini::GeminiProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockConfig, MockProvider};

use serde::{Deserialize, Serialize};

use super::schema::{Classification, IndexEntry};

/// Tracing target for remote AI calls.
pub const TRACING_TARGET: &str = "exfile::provider";

pub const DEFAULT_SUMMARY: &str = "No summary";
pub const DEFAULT_FOLDER: &str = "Manual Review";

/// A single-call async AI capability. Any failure is reported as a
/// [`ProviderError`]; callers decide how to degrade.
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> ProviderResult<RawClassification>;

    async fn search(&self, request: &SearchRequest) -> ProviderResult<SearchResponse>;
}

/// What the classifier sends for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub name: String,
    pub content: RequestContent,
    pub is_image: bool,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RequestContent {
    /// Base64 image bytes, sent inline.
    #[serde(rename_all = "camelCase")]
    InlineBinary { mime_type: String, data: String },
    /// Leading slice of the stored payload.
    TextExcerpt { text: String },
}

/// Classification as returned by the service, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClassification {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub insights: Option<String>,
    #[serde(default)]
    pub suggested_folder: Option<String>,
}

impl RawClassification {
    /// Fill every missing field with its default so no partial result escapes.
    pub fn into_classification(self) -> Classification {
        Classification {
            summary: non_blank(self.summary).unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
            tags: self.tags.unwrap_or_default(),
            insights: self.insights.unwrap_or_default(),
            suggested_folder: non_blank(self.suggested_folder)
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub index: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub relevant_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_get_defaults() {
        let raw: RawClassification = serde_json::from_str(r#"{"tags":["a"]}"#).unwrap();
        let c = raw.into_classification();
        assert_eq!(c.summary, DEFAULT_SUMMARY);
        assert_eq!(c.tags, vec!["a".to_string()]);
        assert_eq!(c.insights, "");
        assert_eq!(c.suggested_folder, DEFAULT_FOLDER);
    }

    #[test]
    fn blank_folder_is_treated_as_missing() {
        let raw = RawClassification {
            summary: Some("ok".into()),
            suggested_folder: Some("  ".into()),
            ..Default::default()
        };
        let c = raw.into_classification();
        assert_eq!(c.summary, "ok");
        assert_eq!(c.suggested_folder, DEFAULT_FOLDER);
    }

    #[test]
    fn search_response_tolerates_missing_ids() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.relevant_ids.is_empty());
    }

    #[test]
    fn request_content_wire_shape() {
        let json = serde_json::to_value(RequestContent::InlineBinary {
            mime_type: "image/png".into(),
            data: "AAAA".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "inlineBinary");
        assert_eq!(json["mimeType"], "image/png");
    }
}
