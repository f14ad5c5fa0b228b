
pub mod protocol;

use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::MistralConfig;
use crate::config::settings::API_KEY_ENV;
use crate::{AugurError, Result};

pub use protocol::{ChatMessage, ChatRequest, FunctionCall, Tool, ToolCall};

use protocol::{ChatResponse, EmbeddingsRequest, EmbeddingsResponse};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const EMBEDDINGS_PATH: &str = "/v1/embeddings";

/// Blocking client for the Mistral platform API
#[derive(Debug, Clone)]
pub struct MistralClient {
    base_url: Url,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    batch_size: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl MistralClient {
    #[inline]
    pub fn new(config: &MistralConfig, api_key: impl Into<String>) -> Result<Self> {
        let base_url = config
            .endpoint_url()
            .map_err(|e| AugurError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            batch_size: config.batch_size,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Build a client taking the API key from `MISTRAL_API_KEY`
    #[inline]
    pub fn from_env(config: &MistralConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| AugurError::Config(format!("{API_KEY_ENV} is not set")))?;
        Self::new(config, api_key)
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Request a completion without tools and return the assistant's text
    #[inline]
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: messages.to_vec(),
            tools: None,
            tool_choice: None,
        };

        let message = self.send_chat_request(&request)?;
        message.content.ok_or_else(|| {
            AugurError::Provider("chat response carried no text content".to_string())
        })
    }

    /// Request a completion with declared tools and return the raw
    /// assistant message, which may carry tool calls instead of text
    #[inline]
    pub fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[Tool],
    ) -> Result<ChatMessage> {
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: messages.to_vec(),
            tools: Some(tools.to_vec()),
            tool_choice: Some("auto".to_string()),
        };

        self.send_chat_request(&request)
    }

    /// Embed one batch of texts with a single request. The input must
    /// respect the provider's request-size limit; `embed_batch` partitions
    /// arbitrary inputs.
    #[inline]
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts", texts.len());

        let request = EmbeddingsRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response_text = self.post_json(EMBEDDINGS_PATH, &request)?;
        let response: EmbeddingsResponse = serde_json::from_str(&response_text).map_err(|e| {
            AugurError::Provider(format!("failed to parse embeddings response: {e}"))
        })?;

        if response.data.len() != texts.len() {
            return Err(AugurError::Provider(format!(
                "embeddings count mismatch: requested {}, received {}",
                texts.len(),
                response.data.len()
            )));
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Embed any number of texts, partitioning the input into contiguous
    /// chunks of at most the configured batch size. Output order matches
    /// input order. Any failed chunk aborts the whole pass.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Embedding {} texts in chunks of at most {}",
            texts.len(),
            self.batch_size
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size as usize) {
            vectors.extend(self.embed(chunk)?);
        }

        debug!("Embedded {} texts total", vectors.len());
        Ok(vectors)
    }

    fn send_chat_request(&self, request: &ChatRequest) -> Result<ChatMessage> {
        debug!(
            "Requesting chat completion with {} messages (tools: {})",
            request.messages.len(),
            request.tools.is_some()
        );

        let response_text = self.post_json(CHAT_COMPLETIONS_PATH, request)?;
        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| AugurError::Provider(format!("failed to parse chat response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AugurError::Provider("chat response carried no choices".to_string()))
    }

    fn post_json<T: serde::Serialize>(&self, path: &str, request: &T) -> Result<String> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AugurError::Provider(format!("failed to build request URL: {e}")))?;

        let request_json = serde_json::to_string(request)
            .map_err(|e| AugurError::Provider(format!("failed to serialize request: {e}")))?;

        let authorization = format!("Bearer {}", self.api_key);
        self.make_request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .header("Authorization", authorization.as_str())
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    let retryable = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                return Err(AugurError::Provider(format!(
                                    "request rejected with HTTP {status}"
                                )));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !retryable {
                        return Err(AugurError::Provider(format!(
                            "non-retryable request error: {error}"
                        )));
                    }

                    last_error = Some(AugurError::Provider(format!("request error: {error}")));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AugurError::Provider("request failed after retries".to_string())
        }))
    }
}
