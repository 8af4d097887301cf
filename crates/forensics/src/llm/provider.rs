use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone, Error)]
pub enum LLMError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LLMError {
    /// Transient failures. The fallback chain logs this; it moves on to the
    /// next candidate either way.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LLMError::Authentication(_) | LLMError::Configuration(_))
    }
}

#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt: String,
    pub image: Vec<u8>,
    pub mime_type: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl VisionRequest {
    pub fn new(prompt: impl Into<String>, image: &[u8]) -> Self {
        Self {
            prompt: prompt.into(),
            mime_type: sniff_mime_type(image).to_string(),
            image: image.to_vec(),
            temperature: 0.2,
            max_tokens: 2048,
        }
    }

    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.image))
    }
}

#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One candidate backend model that can read an image and answer a prompt.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn analyze(&self, request: &VisionRequest) -> Result<VisionResponse, LLMError>;

    fn model_name(&self) -> &str;
}

pub fn sniff_mime_type(image: &[u8]) -> &'static str {
    infer::get(image)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Chat-completions backend over any OpenAI-compatible endpoint.
pub struct OpenAIVisionProvider {
    client: Client<OpenAIConfig>,
    model: String,
    timeout_seconds: u64,
}

impl OpenAIVisionProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>, model: impl Into<String>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key.into());
        if let Some(base) = base_url {
            config = config.with_api_base(base.trim_end_matches('/'));
        }

        Self {
            client: Client::with_config(config),
            model: model.into(),
            timeout_seconds: 60,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    fn classify(&self, error: OpenAIError) -> LLMError {
        match error {
            OpenAIError::Reqwest(e) if e.is_timeout() => LLMError::Timeout(self.timeout_seconds),
            OpenAIError::Reqwest(e) => LLMError::NetworkError(e.to_string()),
            OpenAIError::JSONDeserialize(e) => LLMError::InvalidResponse(e.to_string()),
            OpenAIError::InvalidArgument(message) => LLMError::Configuration(message),
            other => {
                let message = other.to_string();
                let lowered = message.to_lowercase();
                if ["rate limit", "429", "quota", "exhausted"]
                    .iter()
                    .any(|needle| lowered.contains(needle))
                {
                    LLMError::RateLimitExceeded(message)
                } else if ["api key", "api_key", "401", "unauthorized", "unauthenticated"]
                    .iter()
                    .any(|needle| lowered.contains(needle))
                {
                    LLMError::Authentication(message)
                } else {
                    LLMError::ApiError(message)
                }
            }
        }
    }
}

#[async_trait]
impl VisionProvider for OpenAIVisionProvider {
    async fn analyze(&self, request: &VisionRequest) -> Result<VisionResponse, LLMError> {
        debug!(
            model = %self.model,
            mime_type = %request.mime_type,
            image_bytes = request.image.len(),
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "Sending vision request"
        );

        let build_error = |e: OpenAIError| LLMError::Configuration(e.to_string());

        let max_tokens = u16::try_from(request.max_tokens).map_err(|_| {
            LLMError::Configuration(format!(
                "max_tokens {} exceeds the request limit of {}",
                request.max_tokens,
                u16::MAX
            ))
        })?;

        let text = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(request.prompt.clone())
            .build()
            .map_err(build_error)?;

        let image = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(request.data_url())
                    .build()
                    .map_err(build_error)?,
            )
            .build()
            .map_err(build_error)?;

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(vec![
                text.into(),
                image.into(),
            ]))
            .build()
            .map_err(build_error)?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![user_message.into()];

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(build_error)?;

        let chat = self.client.chat();
        let call = chat.create(api_request);
        let response = match tokio::time::timeout(Duration::from_secs(self.timeout_seconds), call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let error = self.classify(e);
                warn!(model = %self.model, error = %error, "Vision request failed");
                return Err(error);
            }
            Err(_) => {
                warn!(model = %self.model, seconds = self.timeout_seconds, "Vision request timed out");
                return Err(LLMError::Timeout(self.timeout_seconds));
            }
        };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LLMError::InvalidResponse("No content in response".to_string()))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(model = %self.model, tokens = usage.total_tokens, "Received vision response");

        Ok(VisionResponse {
            content,
            model: self.model.clone(),
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
