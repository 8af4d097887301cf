use crate::llm::{
    config::{mask_secret, ProviderConfig, SentinelConfig, DEFAULT_BASE_URL},
    fallback::ModelFallback,
    provider::{OpenAIVisionProvider, VisionProvider},
    simulated::SimulatedVisionProvider,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the candidate chain once from immutable configuration.
pub struct VisionProviderFactory;

impl VisionProviderFactory {
    pub fn from_config(config: &SentinelConfig) -> ModelFallback {
        match &config.provider {
            ProviderConfig::OpenAI {
                models,
                api_key: Some(key),
                base_url,
            } => {
                let base = base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
                info!(
                    key = %mask_secret(key),
                    base_url = base,
                    candidates = models.len(),
                    "Vision API key found"
                );

                let candidates = models
                    .iter()
                    .map(|model| {
                        Arc::new(
                            OpenAIVisionProvider::new(key.clone(), Some(base), model.clone())
                                .with_timeout(config.vision.timeout_seconds),
                        ) as Arc<dyn VisionProvider>
                    })
                    .collect();

                ModelFallback::new(candidates)
            }
            ProviderConfig::OpenAI { api_key: None, .. } => {
                warn!("GEMINI_API_KEY not found. AI analysis will be SIMULATED");
                Self::simulated()
            }
            ProviderConfig::Simulated => {
                info!("Using simulated vision provider");
                Self::simulated()
            }
        }
    }

    pub fn simulated() -> ModelFallback {
        ModelFallback::single(Arc::new(SimulatedVisionProvider::new()))
    }
}
