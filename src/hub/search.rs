//! Search resolution: debounced semantic search with local substring fallback.
//!
//! Every submitted query bumps a generation counter. A resolution is only
//! applied when its captured generation is still current, so a slow answer
//! for an old query can never replace the result for a newer one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::connectivity::Connectivity;
use super::provider::{AiProvider, SearchRequest};
use super::schema::{FileRecord, IndexEntry};

/// Tracing target for search resolution.
pub const TRACING_TARGET: &str = "exfile::search";

/// Quiet period before a semantic search is dispatched.
pub const DEBOUNCE: Duration = Duration::from_millis(600);

/// Queries of this many characters or fewer never leave the local filter.
pub const MIN_QUERY_CHARS: usize = 3;

/// Ids the AI service judged relevant for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticMatch {
    pub query: String,
    pub ids: HashSet<String>,
}

impl SemanticMatch {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// Resolver output as observed by subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Generation of the latest submitted query.
    pub generation: u64,
    /// Latest submitted query.
    pub query: String,
    /// `None` means the local substring filter applies.
    pub semantic: Option<SemanticMatch>,
}

/// Whether a query stays on the local filter without any remote call.
pub fn is_idle(query: &str, collection_len: usize) -> bool {
    query.chars().count() <= MIN_QUERY_CHARS || collection_len == 0
}

/// Name-or-tag substring match, case-insensitive. An empty query keeps everything.
pub fn local_filter<'a, I>(query: &str, files: I) -> Vec<&'a FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    files.into_iter().filter(|f| f.matches_text(query)).collect()
}

/// Single-slot debounced resolver. Must be driven from within a Tokio runtime.
pub struct SearchResolver {
    provider: Option<Arc<dyn AiProvider>>,
    debounce: Duration,
    state: Arc<watch::Sender<Resolution>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    dispatched: Arc<AtomicUsize>,
}

impl std::fmt::Debug for SearchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchResolver")
            .field("remote", &self.provider.is_some())
            .field("debounce", &self.debounce)
            .field("resolution", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SearchResolver {
    pub fn new(provider: Option<Arc<dyn AiProvider>>) -> Self {
        let (tx, _) = watch::channel(Resolution::default());
        Self {
            provider,
            debounce: DEBOUNCE,
            state: Arc::new(tx),
            pending: Mutex::new(None),
            dispatched: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Submit the latest query text together with the index of the files in view.
    ///
    /// Returns the generation assigned to this query. Short queries, empty
    /// collections and offline mode resolve immediately to the local filter;
    /// otherwise a semantic search is scheduled after [`DEBOUNCE`].
    pub fn submit(&self, query: &str, entries: Vec<IndexEntry>, connectivity: Connectivity) -> u64 {
        let idle = is_idle(query, entries.len());
        let provider = self
            .provider
            .clone()
            .filter(|_| connectivity.is_online() && !idle);

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            // The index may have changed since the last answer, even for the same text.
            s.semantic = None;
            s.query = query.to_string();
        });

        let Some(provider) = provider else {
            if !idle {
                tracing::debug!(target: TRACING_TARGET, query = %query, "No semantic search available, using local filter");
            }
            return generation;
        };

        let state = Arc::clone(&self.state);
        let dispatched = Arc::clone(&self.dispatched);
        let debounce = self.debounce;
        let query = query.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if state.borrow().generation != generation {
                tracing::trace!(target: TRACING_TARGET, query = %query, generation, "Superseded before dispatch");
                return;
            }

            dispatched.fetch_add(1, Ordering::SeqCst);
            let request = SearchRequest {
                query: query.clone(),
                index: entries,
            };
            match provider.search(&request).await {
                Ok(resp) => {
                    let hits = resp.relevant_ids.len();
                    let applied = state.send_if_modified(|s| {
                        if s.generation != generation {
                            return false;
                        }
                        s.semantic = Some(SemanticMatch {
                            query: request.query,
                            ids: resp.relevant_ids.into_iter().collect(),
                        });
                        true
                    });
                    if applied {
                        tracing::debug!(target: TRACING_TARGET, query = %query, hits, "Semantic search resolved");
                    } else {
                        tracing::debug!(target: TRACING_TARGET, query = %query, generation, "Discarding stale semantic result");
                    }
                }
                Err(err) => {
                    tracing::warn!(target: TRACING_TARGET, query = %query, kind = ?err.kind, error = %err.message, "Semantic search failed, using local filter");
                    state.send_if_modified(|s| {
                        if s.generation != generation || s.semantic.is_none() {
                            return false;
                        }
                        s.semantic = None;
                        true
                    });
                }
            }
        });

        // The previous task is left to finish; its generation check discards it.
        *self.pending.lock() = Some(handle);
        generation
    }

    /// The active semantic result, if any.
    pub fn current(&self) -> Option<SemanticMatch> {
        self.state.borrow().semantic.clone()
    }

    pub fn resolution(&self) -> Resolution {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the resolution changes.
    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.state.subscribe()
    }

    /// Number of semantic requests actually sent.
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Wait for the most recently scheduled resolution to finish.
    pub async fn settled(&self) {
        let handle = self.pending.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(target: TRACING_TARGET, error = %err, "Search task panicked");
            }
        }
    }

    /// Files to display for `query`: the semantic result when it belongs to
    /// this exact query, the local substring filter otherwise.
    pub fn filter<'a, I>(&self, query: &str, files: I) -> Vec<&'a FileRecord>
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        let state = self.state.borrow();
        match state.semantic.as_ref().filter(|m| m.query == query) {
            Some(semantic) => files.into_iter().filter(|f| semantic.contains(&f.id)).collect(),
            None => local_filter(query, files),
        }
    }
}
