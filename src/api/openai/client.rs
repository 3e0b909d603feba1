use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use tracing::warn;

use super::models::{ChatCompletionRequest, ChatCompletionResponse, OpenAiError};

/// Chat-completions client for the two language-model calls of the
/// prompting pipeline (tool selection and message composition)
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Create a new chat-completions client
    pub fn new(api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            base_url,
        }
    }

    /// Create default headers with authorization
    fn create_headers(&self) -> Result<HeaderMap, OpenAiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| OpenAiError::Request(format!("Failed to create auth header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// POST /chat/completions
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let headers = self.create_headers()?;

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| OpenAiError::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let body_text = response.text().await.unwrap_or_default();
            if status_code >= 500 {
                warn!("OpenAI server error {}: {}", status_code, body_text);
            }
            return Err(OpenAiError::Http(status_code, body_text));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| OpenAiError::Deserialization(format!("Failed to parse response: {}", e)))
    }
}
