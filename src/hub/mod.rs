//! Smart file hub
//!
//! Handles file ingestion, AI classification with an offline fallback,
//! debounced semantic search with local substring matching, soft delete
//! and persistence of the collection.

pub mod classify;
pub mod collection;
pub mod connectivity;
pub mod extract;
pub mod provider;
pub mod schema;
pub mod search;
pub mod service;
pub mod store;
pub mod upload;

pub use classify::{local_classify, Classifier};
pub use collection::FileCollection;
pub use connectivity::{Connectivity, ConnectivitySignal};
pub use schema::{
    AnalysisStatus, Classification, ContentPayload, FileRecord, IndexEntry, RawFile, Theme,
    ViewMode,
};
pub use search::{SearchResolver, SemanticMatch};
pub use service::FileHub;
pub use store::LocalStore;
