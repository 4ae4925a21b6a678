use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::assistant::config::AssistantConfig;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant is disabled or missing an api key")]
    Disabled,
    #[error("assistant request failed: {0}")]
    Http(String),
    #[error("no assistant model produced a reply")]
    Exhausted,
    #[error("assistant reply had an unexpected shape")]
    Malformed,
}

/// The seam between conversation logic and the model provider. Lets
/// tests drive conversations with a scripted generator.
pub trait TextGenerator {
    fn generate(&self, prompt: &str)
    -> impl Future<Output = Result<String, AssistantError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ModelCatalog {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
    #[serde(default, rename = "supportedGenerationMethods")]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Generative-language HTTP client. Model names are discovered from
/// the provider catalog and tried in order until one answers; the
/// catalog shifts often enough that pinning a single name is fragile.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    http: reqwest::Client,
    config: AssistantConfig,
}

impl HttpAssistant {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        if !config.is_usable() {
            return Err(AssistantError::Disabled);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Http(e.to_string()))?;

        Ok(Self { http, config })
    }

    async fn available_models(&self) -> Result<Vec<String>, AssistantError> {
        if !self.config.models.is_empty() {
            return Ok(self.config.models.clone());
        }

        let url = format!(
            "{}/models?key={}",
            self.config.endpoint, self.config.api_key
        );
        let catalog: ModelCatalog = self
            .http
            .get(url)
            .send()
            .await
            .map_err(sanitize_http_error)?
            .error_for_status()
            .map_err(sanitize_http_error)?
            .json()
            .await
            .map_err(sanitize_http_error)?;

        let models: Vec<String> = catalog
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| {
                m.name
                    .strip_prefix("models/")
                    .unwrap_or(&m.name)
                    .to_string()
            })
            .collect();

        if models.is_empty() {
            return Err(AssistantError::Exhausted);
        }
        Ok(models)
    }

    async fn generate_with_model(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, AssistantError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, model, self.config.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response: GenerateResponse = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(sanitize_http_error)?
            .error_for_status()
            .map_err(sanitize_http_error)?
            .json()
            .await
            .map_err(sanitize_http_error)?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AssistantError::Malformed)?;

        Ok(text)
    }
}

/// Request URLs carry the api key as a query parameter, so strip the
/// url before stringifying a reqwest error.
fn sanitize_http_error(error: reqwest::Error) -> AssistantError {
    AssistantError::Http(error.without_url().to_string())
}

impl TextGenerator for HttpAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let models = self.available_models().await?;

        for model in &models {
            match self.generate_with_model(model, prompt).await {
                Ok(text) => {
                    debug!(%model, "assistant reply produced");
                    return Ok(text);
                }
                Err(error) => {
                    warn!(%model, %error, "assistant model failed, trying next");
                }
            }
        }

        Err(AssistantError::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_parsing_keeps_generate_capable_models() {
        let raw = serde_json::json!({
            "models": [
                { "name": "models/gemini-pro",
                  "supportedGenerationMethods": ["generateContent", "countTokens"] },
                { "name": "models/embedding-001",
                  "supportedGenerationMethods": ["embedContent"] },
            ]
        });
        let catalog: ModelCatalog = serde_json::from_value(raw).unwrap();

        let usable: Vec<String> = catalog
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| m.name.strip_prefix("models/").unwrap_or(&m.name).to_string())
            .collect();

        assert_eq!(usable, vec!["gemini-pro"]);
    }

    #[test]
    fn generate_response_shape_matches_provider_payload() {
        let raw = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "  hello there  " } ] } }
            ]
        });
        let response: GenerateResponse = serde_json::from_value(raw).unwrap();

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string());
        assert_eq!(text.as_deref(), Some("hello there"));
    }

    #[test]
    fn constructor_rejects_unusable_config() {
        let result = HttpAssistant::new(AssistantConfig::default());
        assert!(matches!(result, Err(AssistantError::Disabled)));
    }
}
