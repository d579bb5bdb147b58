use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::extract::guess_mime_type;
use super::schema::RawFile;

/// Expand `~` in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Read a file from disk into an upload input.
pub async fn read_upload(path: &Path) -> Result<RawFile> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let meta = fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    let last_modified = meta
        .modified()
        .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
        .unwrap_or_else(|_| Utc::now().timestamp_millis());

    Ok(RawFile {
        mime_type: guess_mime_type(&name),
        size_bytes: bytes.len() as u64,
        name,
        last_modified,
        bytes,
    })
}

/// Read several files, keeping the order they were given in.
pub async fn read_uploads(paths: &[String]) -> Result<Vec<RawFile>> {
    let mut out = Vec::with_capacity(paths.len());
    for p in paths {
        out.push(read_upload(&expand_path(p)).await?);
    }
    Ok(out)
}
