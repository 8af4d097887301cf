//! Ordered fallback across candidate vision models.

use super::provider::{LLMError, VisionProvider, VisionRequest, VisionResponse};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error)]
pub enum FallbackError {
    #[error("No candidate models configured")]
    NoCandidates,

    #[error("All models failed. Last error: {last_error}")]
    Exhausted { attempts: usize, last_error: LLMError },
}

pub struct ModelFallback {
    candidates: Vec<Arc<dyn VisionProvider>>,
}

impl ModelFallback {
    pub fn new(candidates: Vec<Arc<dyn VisionProvider>>) -> Self {
        Self { candidates }
    }

    pub fn single(provider: Arc<dyn VisionProvider>) -> Self {
        Self::new(vec![provider])
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.model_name())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Tries each candidate in priority order until one answers. Every
    /// failure moves on to the next candidate; the chain only fails once all
    /// of them have.
    pub async fn analyze(&self, request: &VisionRequest) -> Result<VisionResponse, FallbackError> {
        let mut last_error = None;

        for (attempt, candidate) in self.candidates.iter().enumerate() {
            let model = candidate.model_name();
            info!(model, attempt = attempt + 1, "Trying model");

            match candidate.analyze(request).await {
                Ok(response) => {
                    info!(model, "Model answered");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        model,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Model failed, trying next candidate"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last_error) => Err(FallbackError::Exhausted {
                attempts: self.candidates.len(),
                last_error,
            }),
            None => Err(FallbackError::NoCandidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock_provider::MockVisionProvider;

    fn request() -> VisionRequest {
        VisionRequest::new("prompt", b"image")
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = Arc::new(MockVisionProvider::new("first"));
        let second = Arc::new(MockVisionProvider::new("second"));
        let chain = ModelFallback::new(vec![first.clone(), second.clone()]);

        let response = chain.analyze(&request()).await.unwrap();
        assert_eq!(response.model, "first");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_moves_to_next() {
        let first = Arc::new(MockVisionProvider::rate_limited("first"));
        let second = Arc::new(MockVisionProvider::new("second"));
        let chain = ModelFallback::new(vec![first.clone(), second.clone()]);

        let response = chain.analyze(&request()).await.unwrap();
        assert_eq!(response.model, "second");
        assert_eq!(first.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_reports_last_error() {
        let chain = ModelFallback::new(vec![
            Arc::new(MockVisionProvider::rate_limited("a")),
            Arc::new(MockVisionProvider::failing("b", LLMError::ApiError("boom".into()))),
        ]);

        let error = chain.analyze(&request()).await.unwrap_err();
        assert!(matches!(error, FallbackError::Exhausted { attempts: 2, .. }));
        assert_eq!(error.to_string(), "All models failed. Last error: API error: boom");
    }

    #[tokio::test]
    async fn test_authentication_failure_moves_to_next() {
        let second = Arc::new(MockVisionProvider::new("second"));
        let chain = ModelFallback::new(vec![
            Arc::new(MockVisionProvider::failing(
                "first",
                LLMError::Authentication("permission denied for this model".into()),
            )),
            Arc::new(MockVisionProvider::failing(
                "preview",
                LLMError::Configuration("model not found".into()),
            )),
            second.clone(),
        ]);

        let response = chain.analyze(&request()).await.unwrap();
        assert_eq!(response.model, "second");
        assert_eq!(second.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_exhaust_chain() {
        let chain = ModelFallback::new(vec![
            Arc::new(MockVisionProvider::failing("a", LLMError::Authentication("bad key".into()))),
            Arc::new(MockVisionProvider::failing("b", LLMError::Authentication("bad key".into()))),
        ]);

        let error = chain.analyze(&request()).await.unwrap_err();
        assert!(matches!(error, FallbackError::Exhausted { attempts: 2, .. }));
        assert_eq!(
            error.to_string(),
            "All models failed. Last error: Authentication failed: bad key"
        );
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = ModelFallback::new(Vec::new());
        assert!(chain.is_empty());
        assert!(matches!(
            chain.analyze(&request()).await,
            Err(FallbackError::NoCandidates)
        ));
    }
}
