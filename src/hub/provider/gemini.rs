use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::{
    AiProvider, ClassificationRequest, ProviderError, ProviderResult, RawClassification,
    RequestContent, SearchRequest, SearchResponse, TRACING_TARGET,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// [`AiProvider`] backed by the Gemini `generateContent` endpoint with
/// JSON-schema constrained output.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one request and return the concatenated text of the first candidate.
    async fn generate(&self, parts: Value, schema: Value) -> ProviderResult<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::status(format!("gemini error {}: {}", status, text)));
        }

        let value: Value = resp.json().await?;
        Ok(candidate_text(&value))
    }
}

/// Text parts of `candidates[0]`, joined. Missing text is an empty string.
fn candidate_text(value: &Value) -> String {
    value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// An empty answer reads as an empty object, so every field takes its default.
fn parse_answer<T: serde::de::DeserializeOwned>(text: &str) -> ProviderResult<T> {
    let text = text.trim();
    let text = if text.is_empty() { "{}" } else { text };
    Ok(serde_json::from_str(text)?)
}

fn classification_prompt(name: &str) -> String {
    format!(
        "Analyze this file named \"{name}\". Provide a short summary, 5 relevant tags, \
         an insightful analysis and suggest a single folder (e.g. Documents, Images, \
         Invoices, Reports, Personal) to store it in. If unsure, suggest 'Manual Review'."
    )
}

fn classification_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
            "insights": { "type": "STRING" },
            "suggestedFolder": { "type": "STRING" }
        },
        "required": ["summary", "tags", "insights", "suggestedFolder"]
    })
}

fn search_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "relevantIds": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["relevantIds"]
    })
}

#[async_trait::async_trait]
impl AiProvider for GeminiProvider {
    async fn classify(&self, request: &ClassificationRequest) -> ProviderResult<RawClassification> {
        let prompt = classification_prompt(&request.name);
        let parts = match &request.content {
            RequestContent::InlineBinary { mime_type, data } => json!([
                { "inlineData": { "mimeType": mime_type, "data": data } },
                { "text": prompt }
            ]),
            RequestContent::TextExcerpt { text } => json!([
                { "text": format!("{prompt}\n\nContent/metadata: {text}") }
            ]),
        };

        tracing::debug!(target: TRACING_TARGET, file = %request.name, "Requesting classification");
        let text = self.generate(parts, classification_schema()).await?;
        parse_answer(&text)
    }

    async fn search(&self, request: &SearchRequest) -> ProviderResult<SearchResponse> {
        let index = serde_json::to_string(&request.index)?;
        let prompt = format!(
            "Given the following list of indexed files as JSON:\n{index}\n\n\
             The user searched for: \"{}\".\n\
             Return a JSON array containing only the IDs of the files that are \
             semantically relevant to this search.",
            request.query
        );

        tracing::debug!(
            target: TRACING_TARGET,
            query = %request.query,
            files = request.index.len(),
            "Requesting semantic search"
        );
        let text = self.generate(json!([{ "text": prompt }]), search_schema()).await?;
        parse_answer(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_text_joins_parts() {
        let v = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        });
        assert_eq!(candidate_text(&v), "{\"a\":1}");
        assert_eq!(candidate_text(&json!({})), "");
    }

    #[test]
    fn empty_answer_yields_defaults() {
        let raw: RawClassification = parse_answer("  ").unwrap();
        assert_eq!(raw, RawClassification::default());
    }

    #[test]
    fn garbage_answer_is_malformed() {
        let err = parse_answer::<SearchResponse>("not json").unwrap_err();
        assert_eq!(err.kind, super::super::ProviderErrorKind::Malformed);
    }

    #[test]
    fn endpoint_uses_model() {
        let p = GeminiProvider::new("k", Some("http://localhost:1/"), Some("m1"), Duration::from_secs(1))
            .unwrap();
        assert_eq!(p.endpoint(), "http://localhost:1/models/m1:generateContent");
    }
}
