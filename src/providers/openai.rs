/*!
 * OpenAI-compatible chat-completions client.
 *
 * Supports plain text messages and vision messages carrying base64 image
 * data URLs, which is all the page translators need. The client maps HTTP
 * failures onto [`ProviderError`] variants so callers can wrap calls in a
 * retry policy keyed on the error they observe.
 */

use std::time::Duration;

use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ProviderError;

/// Default public OpenAI API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI-compatible API client
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// Base URL of the API, without the trailing request path
    base_url: String,
    /// API key sent as a bearer token
    api_key: String,
    /// HTTP client for making requests
    client: Client,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system or user)
    pub role: String,
    /// Message payload
    pub content: MessageContent,
}

/// Message payload: plain text, or structured parts for vision requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Multi-part content (text and image URLs)
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text fragment
    Text {
        /// The text itself
        text: String,
    },
    /// Image reference, typically a base64 data URL
    ImageUrl {
        /// The image URL object
        image_url: ImageUrl,
    },
}

/// Image URL wrapper used by the vision API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// Image location or data URL
    pub url: String,
}

/// Chat-completions request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name to use for completion
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl ChatRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    /// Add a system message
    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        });
        self
    }

    /// Add a plain-text user message
    pub fn user_text(mut self, text: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        });
        self
    }

    /// Add a user message carrying an instruction and an image data URL
    pub fn user_image(mut self, text: impl Into<String>, image_data_url: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_url.into(),
                    },
                },
            ]),
        });
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Chat-completions response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; the first one carries the translation
    pub choices: Vec<ChatChoice>,
    /// Token usage for the request, when the provider reports it
    pub usage: Option<Usage>,
}

/// A single completion choice
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ResponseMessage,
}

/// Message returned by the model
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    /// Generated text content
    pub content: Option<String>,
}

/// Token usage block
#[derive(Debug, Deserialize)]
pub struct Usage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
    /// Total number of tokens
    pub total_tokens: u32,
}

impl OpenAI {
    /// Create a new client with the given API key, endpoint, and timeout
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();
        let base_url = if endpoint.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            // Validate early so a bad endpoint fails construction rather
            // than every request
            Url::parse(&endpoint)
                .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint: {}", e)))?;
            endpoint.trim_end_matches('/').to_string()
        };

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        })
    }

    /// Complete a chat request
    pub async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Provider request to {} failed with {}: {}", url, status, message);

            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(message),
                429 => ProviderError::RateLimitExceeded(message),
                code => ProviderError::ApiError {
                    status_code: code,
                    message,
                },
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Extract the generated text from a response
    pub fn extract_text(response: &ChatResponse) -> String {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
