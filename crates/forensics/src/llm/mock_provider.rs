use crate::llm::provider::{LLMError, TokenUsage, VisionProvider, VisionRequest, VisionResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const AUTHENTIC_RESPONSE: &str = r#"{
    "is_suspicious": false,
    "confidence": 0.9,
    "font_consistency_score": 95,
    "alignment_score": 95,
    "findings": [],
    "explanation": "Receipt layout matches a genuine banking app screenshot."
}"#;

pub const FORGED_RESPONSE: &str = r#"```json
{
    "is_suspicious": true,
    "confidence": 0.85,
    "font_consistency_score": 70,
    "alignment_score": 85,
    "findings": [
        {"issue": "Amount digits use a different font weight", "severity": "HIGH"}
    ],
    "explanation": "The amount field appears pasted over the original."
}
```"#;

/// Scripted vision backend that counts its calls and remembers the last prompt.
pub struct MockVisionProvider {
    model: String,
    response: String,
    failure: Option<LLMError>,
    call_count: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl Default for MockVisionProvider {
    fn default() -> Self {
        Self::new("mock-vision")
    }
}

impl MockVisionProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response: AUTHENTIC_RESPONSE.to_string(),
            failure: None,
            call_count: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(model: impl Into<String>, error: LLMError) -> Self {
        let mut provider = Self::new(model);
        provider.failure = Some(error);
        provider
    }

    pub fn rate_limited(model: impl Into<String>) -> Self {
        Self::failing(
            model,
            LLMError::RateLimitExceeded("429 RESOURCE_EXHAUSTED".to_string()),
        )
    }

    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response = content.into();
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn analyze(&self, request: &VisionRequest) -> Result<VisionResponse, LLMError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_prompt.lock() {
            *guard = Some(request.prompt.clone());
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(VisionResponse {
            content: self.response.clone(),
            model: self.model.clone(),
            usage: TokenUsage::default(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
