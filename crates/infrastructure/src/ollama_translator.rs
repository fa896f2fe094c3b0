//! Ollama-backed translator for natural-language queries.

use std::time::Duration;

use async_trait::async_trait;
use kubegate_application::CommandTranslator;
use kubegate_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;

/// Connection settings for the Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Ollama base URL, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model name to generate with.
    pub model: String,
    /// Per-request timeout in seconds. Local models can be slow to warm up.
    pub timeout_seconds: u64,
}

/// [`CommandTranslator`] over Ollama's `/api/generate` endpoint.
pub struct OllamaTranslator {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaTranslator {
    /// Builds a translator from connection settings.
    pub fn new(config: OllamaConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build Ollama HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model,
        })
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        "You are an expert Kubernetes assistant. Translate the user's request \
         into exactly one kubectl command.\n\
         Rules:\n\
         - Respond with JSON: {{\"kubectl_command\": \"...\"}}\n\
         - Only read operations (get, list, describe, logs) or scale.\n\
         - Never suggest delete, edit, patch or apply.\n\
         - Omit the namespace flag unless the user names a namespace.\n\
         Request: {query}"
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl CommandTranslator for OllamaTranslator {
    async fn translate(&self, query: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.model,
                "prompt": build_prompt(query),
                "stream": false,
            }))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("translation request failed: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "translation backend returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            AppError::Internal(format!("malformed translation response: {error}"))
        })?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerateResponse, build_prompt};

    #[test]
    fn prompt_embeds_the_query_and_constraints() {
        let prompt = build_prompt("show me the pods in web");
        assert!(prompt.contains("Request: show me the pods in web"));
        assert!(prompt.contains("kubectl_command"));
        assert!(prompt.contains("Never suggest delete"));
    }

    #[test]
    fn generate_response_tolerates_a_missing_field() {
        let body: GenerateResponse =
            serde_json::from_str("{}").unwrap_or_else(|_| unreachable!());
        assert!(body.response.is_empty());
    }
}
