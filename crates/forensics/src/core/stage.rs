//! Stage contracts for the three analyzers the pipeline sequences.
//!
//! Every analyzer is infallible from the orchestrator's point of view:
//! internal failures come back as flags and neutral fields on the stage
//! result, never as errors. The vision stage additionally records an
//! explicit failure marker when its remote call could not be completed.

use crate::core::context::VisionContext;
use crate::core::flag::{ForensicFlag, Severity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaResult {
    pub is_edited: bool,
    pub software_detected: Option<String>,
    pub hardware_detected: Option<String>,
    pub flags: Vec<ForensicFlag>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrivacyResult {
    /// `None` when redaction could not run; the orchestrator then forwards
    /// the original bytes.
    pub redacted_image: Option<Vec<u8>>,
    pub amount_detected: Option<String>,
    pub regions_redacted: usize,
    pub flags: Vec<ForensicFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionResult {
    pub is_suspicious: bool,
    pub confidence: f64,
    pub font_consistency_score: u8,
    pub alignment_score: u8,
    pub explanation: String,
    pub model_used: Option<String>,
    pub flags: Vec<ForensicFlag>,
    /// Set when every backend candidate failed.
    pub failure: Option<String>,
}

impl Default for VisionResult {
    fn default() -> Self {
        Self::neutral()
    }
}

impl VisionResult {
    /// Scores that neither raise nor lower risk.
    pub fn neutral() -> Self {
        Self {
            is_suspicious: false,
            confidence: 0.0,
            font_consistency_score: 100,
            alignment_score: 100,
            explanation: String::new(),
            model_used: None,
            flags: Vec::new(),
            failure: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        let mut result = Self::neutral();
        result.flags.push(ForensicFlag::vision(
            Severity::High,
            format!("AI analysis failed: {}", error),
            0.0,
        ));
        result.explanation = "AI analysis could not be completed.".to_string();
        result.failure = Some(error);
        result
    }

    pub fn high_severity_count(&self) -> usize {
        self.flags.iter().filter(|f| f.is_high()).count()
    }
}

pub trait MetadataAnalyzer: Send + Sync {
    fn name(&self) -> &'static str {
        "Agent Meta"
    }

    fn icon(&self) -> &'static str {
        "[META]"
    }

    fn analyze(&self, image: &[u8]) -> MetaResult;

    fn status_log(&self, result: &MetaResult) -> Vec<String> {
        vec![format!(
            "{} Metadata scan complete ({} flags)",
            self.icon(),
            result.flags.len()
        )]
    }
}

pub trait TextPrivacyAnalyzer: Send + Sync {
    fn name(&self) -> &'static str {
        "Agent Privacy"
    }

    fn icon(&self) -> &'static str {
        "[PRIV]"
    }

    fn analyze(&self, image: &[u8]) -> PrivacyResult;

    fn status_log(&self, result: &PrivacyResult) -> Vec<String> {
        vec![format!(
            "{} Privacy scan complete ({} regions redacted)",
            self.icon(),
            result.regions_redacted
        )]
    }
}

#[async_trait]
pub trait VisionForensicsAnalyzer: Send + Sync {
    fn name(&self) -> &'static str {
        "Agent Vision"
    }

    fn icon(&self) -> &'static str {
        "[VISION]"
    }

    async fn analyze(&self, image: &[u8], context: &VisionContext) -> VisionResult;

    fn status_log(&self, result: &VisionResult) -> Vec<String> {
        vec![format!(
            "{} Visual analysis complete ({})",
            self.icon(),
            result.model_used.as_deref().unwrap_or("no model")
        )]
    }
}
