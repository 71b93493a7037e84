use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, Credential};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: MessageRole,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "function", rename_all = "lowercase")]
pub enum ToolDefinition {
    Function(FunctionDefinition),
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self::Function(FunctionDefinition {
            name: name.into(),
            description: description.into(),
            parameters,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Function(function) => &function.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "is_empty")]
    pub tools: &'a [ToolDefinition],
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InferenceResponse {
    // OpenRouter answers upstream failures with 200 and an `error` object.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub message: Message,
}

impl InferenceResponse {
    /// Takes the first choice; any further choices are dropped.
    pub fn into_first_message(self) -> Result<Message, LLMError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(LLMError::EmptyResponse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    ApiError { status: StatusCode, body: String },
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Provider returned no choices")]
    EmptyResponse,
    #[error("Request cancelled")]
    Cancelled,
}

#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<Message, LLMError>;

    fn model_info(&self) -> ModelInfo;
}

pub struct OpenRouterClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: ClientConfig) -> Result<Self, LLMError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LLMError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn api_key(&self) -> Result<String, LLMError> {
        match &self.config.credential {
            Credential::Static(key) if !key.is_empty() => Ok(key.clone()),
            Credential::Static(_) => Err(LLMError::ConfigError("API key is empty".to_string())),
            Credential::Env(var) => match std::env::var(var) {
                Ok(key) if !key.is_empty() => Ok(key),
                _ => Err(LLMError::ConfigError(format!(
                    "API key not found. Please set the {var} environment variable."
                ))),
            },
        }
    }

    async fn send(
        &self,
        api_key: &str,
        request: &InferenceRequest<'_>,
    ) -> Result<Message, LLMError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        // Consumes the response, so the connection is released before decoding.
        let body = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!(%status, "provider rejected completion request");
            return Err(LLMError::ApiError { status, body });
        }

        let decoded: InferenceResponse = serde_json::from_slice(&body)?;
        tracing::debug!(choices = decoded.choices.len(), "completion received");
        decoded.into_first_message()
    }
}

#[async_trait]
impl LLMClient for OpenRouterClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<Message, LLMError> {
        let api_key = self.api_key()?;

        let request = InferenceRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages,
            tools,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending completion request"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LLMError::Cancelled),
            result = self.send(&api_key, &request) => result,
        }
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
        }
    }
}
