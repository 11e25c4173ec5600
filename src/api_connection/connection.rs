use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Schema,
    JSON_MIME_TYPE,
};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("No candidates received from API (finish reason: {0})")]
    NoCandidates(String),
    /// Failure reported by a non-HTTP generator.
    #[error("{0}")]
    Other(String),
}

/// One structured generation call: prompt text plus the shape the answer must take.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPrompt {
    pub system_instruction: Option<String>,
    pub user_prompt: String,
    pub response_schema: Schema,
}

/// Anything that can turn a [`GenerationPrompt`] into raw JSON text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, ApiConnectionError>;
}

/// Gemini `generateContent` transport.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    pub fn build_request(&self, prompt: &GenerationPrompt) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(prompt.user_prompt.clone())],
            system_instruction: prompt.system_instruction.clone().map(Content::system),
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE.to_string(),
                response_schema: prompt.response_schema.clone(),
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    pub async fn call_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiConnectionError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<GenerateContentResponse>().await?)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, ApiConnectionError> {
        let request = self.build_request(prompt);
        let response = self.call_generate_content(&request).await?;
        if let Some(usage) = &response.usage_metadata {
            debug!(
                model = %self.model,
                prompt_tokens = ?usage.prompt_token_count,
                output_tokens = ?usage.candidates_token_count,
                total_tokens = ?usage.total_token_count,
                "generateContent finished"
            );
        }
        response.first_text().ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "none".to_string());
            ApiConnectionError::NoCandidates(reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_model() {
        let provider = GeminiProvider::new("key", "gemini-2.0-flash-exp", "https://example.test/v1beta/");
        assert_eq!(
            provider.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn build_request_carries_schema_and_system_instruction() {
        let provider = GeminiProvider::new("key", "m", "http://localhost")
            .with_temperature(Some(0.4))
            .with_max_output_tokens(Some(2048));
        let prompt = GenerationPrompt {
            system_instruction: Some("You are a dietitian.".to_string()),
            user_prompt: "plan".to_string(),
            response_schema: Schema::object([("title", Schema::string())], &["title"]),
        };
        let request = provider.build_request(&prompt);
        assert_eq!(request.generation_config.response_mime_type, JSON_MIME_TYPE);
        assert_eq!(request.generation_config.temperature, Some(0.4));
        assert_eq!(request.generation_config.max_output_tokens, Some(2048));
        assert_eq!(request.generation_config.response_schema, prompt.response_schema);
        assert_eq!(
            request.system_instruction.map(|c| c.text()),
            Some("You are a dietitian.".to_string())
        );
    }
}
