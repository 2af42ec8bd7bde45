use tracing::debug;

use crate::error::{AiClientError, Result};
use crate::types::{ChatRequest, ChatResponse, WireMessage};

const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";
const DEFAULT_API_KEY: &str = "lm-studio";

/// Handle for an OpenAI-compatible chat endpoint (LM Studio by default).
#[derive(Clone)]
pub struct LmStudio {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl LmStudio {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build a handle from `LMSTUDIO_BASE_URL` / `LMSTUDIO_API_KEY`,
    /// falling back to the stock local LM Studio settings.
    pub fn from_env(model: impl Into<String>) -> Self {
        let api_key =
            std::env::var("LMSTUDIO_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());
        let base_url =
            std::env::var("LMSTUDIO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, model).with_base_url(base_url)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the model identifier this handle targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let message = response.text().await.unwrap_or_default();
            return Err(AiClientError::RateLimited(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Two-message exchange (system instruction + user prompt), non-streamed.
    /// Returns the first choice's assistant text.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .temperature(temperature);

        let response = self.chat(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiClientError::EmptyResponse)
    }
}
