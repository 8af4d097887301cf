use crate::llm::provider::{LLMError, TokenUsage, VisionProvider, VisionRequest, VisionResponse};
use async_trait::async_trait;
use tracing::debug;

pub const SIMULATED_MODEL: &str = "simulated";

pub const SIMULATED_RESPONSE: &str = r#"{
    "is_suspicious": false,
    "confidence": 0.7,
    "font_consistency_score": 85,
    "alignment_score": 90,
    "findings": [],
    "explanation": "This is a simulated analysis. Configure GEMINI_API_KEY for real AI analysis."
}"#;

/// Stands in for the remote model when no credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct SimulatedVisionProvider;

impl SimulatedVisionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VisionProvider for SimulatedVisionProvider {
    async fn analyze(&self, request: &VisionRequest) -> Result<VisionResponse, LLMError> {
        debug!(image_bytes = request.image.len(), "Returning simulated vision analysis");

        Ok(VisionResponse {
            content: SIMULATED_RESPONSE.to_string(),
            model: SIMULATED_MODEL.to_string(),
            usage: TokenUsage::default(),
        })
    }

    fn model_name(&self) -> &str {
        SIMULATED_MODEL
    }
}
