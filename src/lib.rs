//! exfile: a smart file hub.
//!
//! Uploaded files are classified by a remote AI service (falling back to an
//! extension heuristic when it is unreachable), browsed by folder, searched
//! semantically or by substring, and soft-deleted into a trash.

#![forbid(unsafe_code)]

pub mod config;
pub mod hub;

pub use config::Config;
pub use hub::{FileHub, FileRecord, ViewMode};
