//! File classification: remote AI analysis with an extension-based fallback.

use std::sync::Arc;
use std::time::Duration;

use super::connectivity::Connectivity;
use super::extract::{excerpt, extension, MAX_EXCERPT_CHARS};
use super::provider::{
    AiProvider, ClassificationRequest, ProviderError, ProviderErrorKind, ProviderResult,
    RawClassification, RequestContent,
};
use super::schema::{Classification, FileRecord};

/// Tracing target for classification.
pub const TRACING_TARGET: &str = "exfile::classify";

pub const OFFLINE_SUMMARY: &str =
    "Limited analysis (offline). Full analysis requires an internet connection.";
pub const OFFLINE_INSIGHTS: &str = "You are offline, so only the file extension was inspected. \
     Reconnect to let the content itself be analyzed.";
pub const OFFLINE_TAG: &str = "offline";
pub const UNKNOWN_EXTENSION_TAG: &str = "file";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Folder for a lowercase extension under the offline heuristic.
pub fn folder_for_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("jpg" | "png" | "jpeg" | "webp") => "Images",
        Some("pdf" | "docx" | "txt") => "Documents",
        Some("mp4" | "mov") => "Videos",
        _ => "Other",
    }
}

/// Classify from the file name alone. Pure: the same extension always
/// yields the same folder and tags.
pub fn local_classify(filename: &str) -> Classification {
    let ext = extension(filename);
    Classification {
        summary: OFFLINE_SUMMARY.to_string(),
        tags: vec![
            ext.clone().unwrap_or_else(|| UNKNOWN_EXTENSION_TAG.to_string()),
            OFFLINE_TAG.to_string(),
        ],
        insights: OFFLINE_INSIGHTS.to_string(),
        suggested_folder: folder_for_extension(ext.as_deref()).to_string(),
    }
}

/// Maps file records to classifications. Never fails: any remote problem
/// degrades to [`local_classify`].
#[derive(Clone)]
pub struct Classifier {
    provider: Option<Arc<dyn AiProvider>>,
    timeout: Duration,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("remote", &self.provider.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Classifier {
    pub fn new(provider: Option<Arc<dyn AiProvider>>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A classifier with no remote capability at all.
    pub fn offline() -> Self {
        Self::new(None)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the remote request: inline bytes for images, a text excerpt otherwise.
    pub fn request_for(file: &FileRecord) -> ClassificationRequest {
        let content = match (file.is_image, file.content.base64_data()) {
            (true, Some(data)) => RequestContent::InlineBinary {
                mime_type: file.mime_type.clone(),
                data: data.to_string(),
            },
            _ => RequestContent::TextExcerpt {
                text: excerpt(file.content.as_str(), MAX_EXCERPT_CHARS).to_string(),
            },
        };
        ClassificationRequest {
            name: file.name.clone(),
            content,
            is_image: file.is_image,
            mime_type: file.mime_type.clone(),
        }
    }

    pub async fn classify(&self, file: &FileRecord, connectivity: Connectivity) -> Classification {
        match self.classify_remote(file, connectivity).await {
            Ok(raw) => raw.into_classification(),
            Err(err) => {
                if err.kind == ProviderErrorKind::Unavailable {
                    tracing::debug!(target: TRACING_TARGET, file = %file.name, reason = %err.message, "Classifying offline");
                } else {
                    tracing::warn!(target: TRACING_TARGET, file = %file.name, kind = ?err.kind, error = %err.message, "AI analysis failed, using offline fallback");
                }
                local_classify(&file.name)
            }
        }
    }

    async fn classify_remote(
        &self,
        file: &FileRecord,
        connectivity: Connectivity,
    ) -> ProviderResult<RawClassification> {
        if !connectivity.is_online() {
            return Err(ProviderError::unavailable("offline"));
        }
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ProviderError::unavailable("no AI provider configured"))?;

        let request = Self::request_for(file);
        tokio::time::timeout(self.timeout, provider.classify(&request))
            .await
            .map_err(|_| ProviderError::timeout(format!("no answer within {:?}", self.timeout)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::provider::MockProvider;
    use crate::hub::schema::ContentPayload;

    fn file(name: &str, mime: &str, content: ContentPayload) -> FileRecord {
        FileRecord {
            id: "f1".into(),
            name: name.into(),
            size_bytes: 0,
            mime_type: mime.into(),
            last_modified: 0,
            is_image: mime.starts_with("image/"),
            content,
            is_deleted: false,
            classification: None,
        }
    }

    fn text_file(name: &str) -> FileRecord {
        file(name, "text/plain", ContentPayload::Text("body".into()))
    }

    #[test]
    fn fallback_folder_coverage() {
        for ext in ["jpg", "png", "jpeg", "webp"] {
            assert_eq!(folder_for_extension(Some(ext)), "Images");
        }
        for ext in ["pdf", "docx", "txt"] {
            assert_eq!(folder_for_extension(Some(ext)), "Documents");
        }
        for ext in ["mp4", "mov"] {
            assert_eq!(folder_for_extension(Some(ext)), "Videos");
        }
        assert_eq!(folder_for_extension(Some("zip")), "Other");
        assert_eq!(folder_for_extension(None), "Other");
    }

    #[test]
    fn fallback_is_deterministic() {
        for name in ["a.PDF", "b.png", "c.weird", "noext", "x.MoV"] {
            assert_eq!(local_classify(name), local_classify(name));
        }
    }

    #[test]
    fn fallback_tags() {
        assert_eq!(local_classify("report.pdf").tags, vec!["pdf", "offline"]);
        assert_eq!(local_classify("Photo.PNG").tags, vec!["png", "offline"]);
        assert_eq!(local_classify("Makefile").tags, vec!["file", "offline"]);
    }

    #[tokio::test]
    async fn offline_never_calls_provider() {
        let mock = MockProvider::classifying(RawClassification::default());
        let classifier = Classifier::new(Some(Arc::new(mock.clone())));
        let c = classifier
            .classify(&text_file("report.pdf"), Connectivity::Offline)
            .await;
        assert_eq!(c.suggested_folder, "Documents");
        assert!(mock.classify_calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_falls_back() {
        let mock = MockProvider::default();
        let classifier = Classifier::new(Some(Arc::new(mock.clone())));
        let c = classifier
            .classify(&text_file("clip.mov"), Connectivity::Online)
            .await;
        assert_eq!(c, local_classify("clip.mov"));
        assert_eq!(mock.classify_calls().len(), 1);
    }

    #[tokio::test]
    async fn remote_success_is_validated() {
        let mock = MockProvider::classifying(RawClassification {
            summary: Some("Quarterly numbers".into()),
            tags: Some(vec!["finance".into()]),
            ..Default::default()
        });
        let classifier = Classifier::new(Some(Arc::new(mock)));
        let c = classifier
            .classify(&text_file("q3.txt"), Connectivity::Online)
            .await;
        assert_eq!(c.summary, "Quarterly numbers");
        assert_eq!(c.tags, vec!["finance"]);
        assert_eq!(c.insights, "");
        assert_eq!(c.suggested_folder, "Manual Review");
    }

    #[tokio::test]
    async fn no_provider_behaves_offline() {
        let c = Classifier::offline()
            .classify(&text_file("photo.png"), Connectivity::Online)
            .await;
        assert_eq!(c.suggested_folder, "Images");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_to_fallback() {
        struct Hanging;

        #[async_trait::async_trait]
        impl AiProvider for Hanging {
            async fn classify(&self, _: &ClassificationRequest) -> ProviderResult<RawClassification> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(RawClassification::default())
            }

            async fn search(
                &self,
                _: &crate::hub::provider::SearchRequest,
            ) -> ProviderResult<crate::hub::provider::SearchResponse> {
                Err(ProviderError::transport("unused"))
            }
        }

        let classifier = Classifier::new(Some(Arc::new(Hanging))).with_timeout(Duration::from_secs(5));
        let c = classifier
            .classify(&text_file("notes.txt"), Connectivity::Online)
            .await;
        assert_eq!(c, local_classify("notes.txt"));
    }

    #[test]
    fn image_request_carries_inline_data() {
        let f = file(
            "p.png",
            "image/png",
            ContentPayload::DataUri("data:image/png;base64,QUJD".into()),
        );
        let req = Classifier::request_for(&f);
        assert!(req.is_image);
        assert_eq!(
            req.content,
            RequestContent::InlineBinary {
                mime_type: "image/png".into(),
                data: "QUJD".into()
            }
        );
    }

    #[test]
    fn text_request_is_truncated() {
        let long = "x".repeat(MAX_EXCERPT_CHARS + 50);
        let req = Classifier::request_for(&file("big.txt", "text/plain", ContentPayload::Text(long)));
        match req.content {
            RequestContent::TextExcerpt { text } => assert_eq!(text.chars().count(), MAX_EXCERPT_CHARS),
            other => panic!("unexpected content {other:?}"),
        }
    }
}
