use crate::error::ServiceError;
use crate::llm::prompts::SYSTEM_PROMPT;
use crate::llm::types::*;
use crate::narrative::NarrativeService;
use crate::schema::{NarrativeConfig, DEFAULT_MODEL};
use futures::future::BoxFuture;
use log::debug;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Chat-completions client used for the narrative summary.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = NarrativeConfig::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: defaults.max_response_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Reads the key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, ServiceError> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ServiceError::MissingCredential),
        }
    }

    /// Applies model, answer length, sampling temperature and request timeout.
    pub fn with_settings(mut self, config: &NarrativeConfig) -> Result<Self, ServiceError> {
        self.client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        self.model = config.model.clone();
        self.max_tokens = config.max_response_tokens;
        self.temperature = config.temperature;
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        if self.api_key.trim().is_empty() {
            return Err(ServiceError::MissingCredential);
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("POST {} (model {}, {} prompt chars)", url, self.model, prompt.len());

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ServiceError::Unauthorized(status.as_u16()))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ServiceError::RateLimited),
            _ if !status.is_success() => {
                let err_text = res.text().await.unwrap_or_default();
                return Err(ServiceError::InvalidResponse(format!(
                    "status {}: {}",
                    status, err_text
                )));
            }
            _ => {}
        }

        let body: ChatCompletionResponse = res.json().await.map_err(transport_error)?;

        let text = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::InvalidResponse("No choices returned".to_string()))?
            .message
            .content;

        if text.trim().is_empty() {
            return Err(ServiceError::InvalidResponse(
                "Model returned an empty message".to_string(),
            ));
        }

        Ok(text)
    }
}

impl NarrativeService for OpenAiClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ServiceError>> {
        Box::pin(self.complete(prompt))
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_decode() {
        ServiceError::InvalidResponse(err.to_string())
    } else {
        ServiceError::Transport(err.to_string())
    }
}
