//! Configuration for the exfile hub.
//!
//! Loaded from `config.toml` in the platform config directory (or a path
//! given on the command line). Every field has a default, so a missing file
//! is equivalent to an empty one.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::hub::provider::{AiProvider, GeminiProvider};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Directory holding the local store. Defaults to the platform data dir.
    pub data_dir: Option<String>,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AiConfig {
    /// Enable remote classification and semantic search.
    pub enabled: bool,
    /// API key. Prefer `api_key_env` to keep it out of the file.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            model: None,
            timeout_secs: 30,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Build the remote provider, or `None` when AI is disabled or no key is available.
    pub fn provider(&self) -> Result<Option<Arc<dyn AiProvider>>> {
        if !self.enabled {
            return Ok(None);
        }
        let Some(key) = self.resolve_api_key() else {
            tracing::info!(env = %self.api_key_env, "No AI API key configured, running offline");
            return Ok(None);
        };
        let provider = GeminiProvider::new(
            key,
            self.base_url.as_deref(),
            self.model.as_deref(),
            self.timeout(),
        )?;
        Ok(Some(Arc::new(provider)))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "exfile")
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Directory of the local store, with `~` expanded.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(PathBuf::from(shellexpand::tilde(dir).to_string()));
        }
        project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .context("Could not determine a data directory; set data_dir in config")
    }

    /// JSON Schema of the config file, pretty-printed.
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_ai_section_keeps_defaults() {
        let cfg = Config::parse("data_dir = \"/tmp/x\"\n[ai]\nmodel = \"m\"\n").unwrap();
        assert_eq!(cfg.data_dir.as_deref(), Some("/tmp/x"));
        assert_eq!(cfg.ai.model.as_deref(), Some("m"));
        assert_eq!(cfg.ai.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.ai.timeout_secs, 30);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::parse("data_dir = [").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::load(Some(tmp.path().join("nope.toml").as_path())).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn disabled_ai_has_no_provider() {
        let cfg = AiConfig {
            enabled: false,
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert!(cfg.provider().unwrap().is_none());
    }

    #[test]
    fn configured_key_builds_provider() {
        let cfg = AiConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert!(cfg.provider().unwrap().is_some());
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cfg = Config {
            data_dir: Some("/var/lib/exfile".into()),
            ..Default::default()
        };
        assert_eq!(cfg.data_dir().unwrap(), PathBuf::from("/var/lib/exfile"));
    }

    #[test]
    fn schema_mentions_fields() {
        let schema = Config::json_schema().unwrap();
        assert!(schema.contains("api_key_env"));
    }
}
