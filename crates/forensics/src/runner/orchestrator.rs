use crate::analyzers::{ExifMetadataAnalyzer, PrivacyAgent, VisionAgent};
use crate::core::{
    amount_matches, AgentStatus, AnalysisResult, ForensicFlag, MetadataAnalyzer, PipelineError,
    PipelineOutcome, RiskScorer, StageStatus, TextPrivacyAnalyzer, TransactionContext,
    VisionContext, VisionForensicsAnalyzer, VisionResult,
};
use crate::llm::{SentinelConfig, VisionProviderFactory};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, Instrument, Span};

const DEFAULT_EXPLANATION: &str = "Analysis complete.";

/// Runs metadata, privacy and vision stages in that order and scores the result.
///
/// Holds no per-run state, so one instance can serve concurrent requests.
pub struct Orchestrator {
    meta: Arc<dyn MetadataAnalyzer>,
    privacy: Arc<dyn TextPrivacyAnalyzer>,
    vision: Arc<dyn VisionForensicsAnalyzer>,
    scorer: RiskScorer,
    max_image_bytes: Option<usize>,
}

impl Orchestrator {
    pub fn new(
        meta: Arc<dyn MetadataAnalyzer>,
        privacy: Arc<dyn TextPrivacyAnalyzer>,
        vision: Arc<dyn VisionForensicsAnalyzer>,
    ) -> Self {
        Self {
            meta,
            privacy,
            vision,
            scorer: RiskScorer::new(),
            max_image_bytes: None,
        }
    }

    pub fn from_config(config: &SentinelConfig, privacy: PrivacyAgent) -> Self {
        let fallback = Arc::new(VisionProviderFactory::from_config(config));
        let vision = VisionAgent::new(fallback)
            .with_generation(config.vision.temperature, config.vision.max_tokens);

        Self::new(
            Arc::new(ExifMetadataAnalyzer::new()),
            Arc::new(privacy),
            Arc::new(vision),
        )
        .with_max_image_bytes(config.limits.max_image_bytes)
    }

    pub fn with_max_image_bytes(mut self, limit: usize) -> Self {
        self.max_image_bytes = Some(limit);
        self
    }

    pub async fn run(
        &self,
        image: &[u8],
        context: &TransactionContext,
    ) -> Result<PipelineOutcome, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::EmptyImage);
        }
        if let Some(limit) = self.max_image_bytes {
            if image.len() > limit {
                return Err(PipelineError::ImageTooLarge {
                    size: image.len(),
                    limit,
                });
            }
        }

        let span = info_span!(
            "pipeline",
            bank = %context.expected_bank(),
            image_bytes = image.len()
        );
        self.run_stages(image, context).instrument(span).await
    }

    // The remote stage runs as its own task so a panic surfaces as a
    // JoinError; dropping the set aborts it when the caller gives up.
    async fn run_vision(
        &self,
        image: Vec<u8>,
        context: VisionContext,
    ) -> Result<VisionResult, PipelineError> {
        let vision = Arc::clone(&self.vision);
        let mut tasks = JoinSet::new();
        tasks.spawn(
            async move { vision.analyze(&image, &context).await }.instrument(Span::current()),
        );

        match tasks.join_next().await {
            Some(Ok(result)) => Ok(result),
            Some(Err(e)) if e.is_panic() => {
                Err(PipelineError::Internal("vision stage panicked".to_string()))
            }
            Some(Err(e)) => Err(PipelineError::Internal(format!("vision stage aborted: {}", e))),
            None => Err(PipelineError::Internal("vision stage never started".to_string())),
        }
    }

    async fn run_stages(
        &self,
        image: &[u8],
        context: &TransactionContext,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut meta_status = AgentStatus::pending(self.meta.name(), self.meta.icon());
        let mut privacy_status = AgentStatus::pending(self.privacy.name(), self.privacy.icon());
        let mut vision_status = AgentStatus::pending(self.vision.name(), self.vision.icon());

        enter_stage(&mut meta_status);
        let meta = catch_unwind(AssertUnwindSafe(|| self.meta.analyze(image)))
            .map_err(|_| PipelineError::Internal("metadata stage panicked".to_string()))?;
        meta_status.status = StageStatus::Complete;
        meta_status.logs = self.meta.status_log(&meta);
        debug!(edited = meta.is_edited, flags = meta.flags.len(), "Metadata stage complete");

        enter_stage(&mut privacy_status);
        let privacy = catch_unwind(AssertUnwindSafe(|| self.privacy.analyze(image)))
            .map_err(|_| PipelineError::Internal("privacy stage panicked".to_string()))?;
        privacy_status.status = StageStatus::Complete;
        privacy_status.logs = self.privacy.status_log(&privacy);
        debug!(
            redacted = privacy.redacted_image.is_some(),
            amount = ?privacy.amount_detected,
            flags = privacy.flags.len(),
            "Privacy stage complete"
        );

        // The remote model only ever sees the redacted copy.
        let vision_image = privacy
            .redacted_image
            .as_deref()
            .filter(|bytes| !bytes.is_empty())
            .unwrap_or(image);

        enter_stage(&mut vision_status);
        let vision = self
            .run_vision(vision_image.to_vec(), context.vision_context())
            .await?;
        vision_status.status = if vision.failure.is_some() {
            StageStatus::Error
        } else {
            StageStatus::Complete
        };
        vision_status.logs = self.vision.status_log(&vision);

        let assessment = self.scorer.assess(&meta, &privacy, &vision, context);
        let amount_match =
            amount_matches(privacy.amount_detected.as_deref(), context.claimed_amount());

        let flags: Vec<ForensicFlag> = meta
            .flags
            .into_iter()
            .chain(privacy.flags)
            .chain(vision.flags)
            .collect();

        let explanation = if vision.explanation.trim().is_empty() {
            DEFAULT_EXPLANATION.to_string()
        } else {
            vision.explanation
        };

        info!(
            score = assessment.score,
            verdict = %assessment.verdict,
            flags = flags.len(),
            amount_match,
            "Pipeline complete"
        );

        let analysis = AnalysisResult {
            risk_score: assessment.score,
            verdict: assessment.verdict,
            flags,
            software_detected: meta.software_detected,
            hardware_detected: meta.hardware_detected,
            is_edited: meta.is_edited,
            amount_match,
            amount_detected: privacy.amount_detected,
            font_consistency_score: vision.font_consistency_score,
            alignment_score: vision.alignment_score,
            model_used: vision.model_used,
            explanation,
            score_factors: assessment.factors,
        };

        let agents = vec![meta_status, privacy_status, vision_status];
        let logs = agents.iter().flat_map(|a| a.logs.iter().cloned()).collect();

        Ok(PipelineOutcome {
            analysis,
            agents,
            logs,
        })
    }
}

fn enter_stage(status: &mut AgentStatus) {
    status.status = StageStatus::Running;
    debug!(stage = %status.name, status = %status.status, "Stage started");
}
