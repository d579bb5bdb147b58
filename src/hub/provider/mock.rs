//! Scripted [`AiProvider`] for tests.
//!
//! Only compiled for this crate's tests or with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! exfile = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{
    AiProvider, ClassificationRequest, ProviderError, ProviderResult, RawClassification,
    SearchRequest, SearchResponse,
};

/// Configuration for the mock provider.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Answer to classification requests; `None` makes them fail.
    pub classification: Option<RawClassification>,
    /// Answer to search requests per query; unknown queries return no ids.
    pub relevant_ids: HashMap<String, Vec<String>>,
    /// Make every search request fail.
    pub fail_search: bool,
    /// Simulated latency per search query.
    pub search_delays: HashMap<String, Duration>,
}

/// Records every request it receives and answers from [`MockConfig`].
#[derive(Clone, Debug, Default)]
pub struct MockProvider {
    config: Arc<Mutex<MockConfig>>,
    classify_calls: Arc<Mutex<Vec<ClassificationRequest>>>,
    search_calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            ..Default::default()
        }
    }

    /// A provider that answers every classification with `raw`.
    pub fn classifying(raw: RawClassification) -> Self {
        Self::new(MockConfig {
            classification: Some(raw),
            ..Default::default()
        })
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self::new(MockConfig {
            fail_search: true,
            ..Default::default()
        })
    }

    pub fn set_relevant(&self, query: &str, ids: &[&str]) {
        self.config
            .lock()
            .relevant_ids
            .insert(query.to_string(), ids.iter().map(|s| s.to_string()).collect());
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.config.lock().fail_search = fail;
    }

    pub fn set_search_delay(&self, query: &str, delay: Duration) {
        self.config
            .lock()
            .search_delays
            .insert(query.to_string(), delay);
    }

    pub fn classify_calls(&self) -> Vec<ClassificationRequest> {
        self.classify_calls.lock().clone()
    }

    /// Queries of every search request received, in order.
    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl AiProvider for MockProvider {
    async fn classify(&self, request: &ClassificationRequest) -> ProviderResult<RawClassification> {
        self.classify_calls.lock().push(request.clone());
        self.config
            .lock()
            .classification
            .clone()
            .ok_or_else(|| ProviderError::transport("mock classification failure"))
    }

    async fn search(&self, request: &SearchRequest) -> ProviderResult<SearchResponse> {
        self.search_calls.lock().push(request.query.clone());
        let (delay, fail, ids) = {
            let config = self.config.lock();
            (
                config.search_delays.get(&request.query).copied(),
                config.fail_search,
                config.relevant_ids.get(&request.query).cloned(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ProviderError::transport("mock search failure"));
        }
        Ok(SearchResponse {
            relevant_ids: ids.unwrap_or_default(),
        })
    }
}
