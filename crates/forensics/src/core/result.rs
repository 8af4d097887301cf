use crate::core::flag::{ForensicFlag, Severity};
use crate::core::scoring::{ScoreFactor, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub risk_score: u8,
    pub verdict: Verdict,
    pub flags: Vec<ForensicFlag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_detected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_detected: Option<String>,
    pub is_edited: bool,

    pub amount_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_detected: Option<String>,

    pub font_consistency_score: u8,
    pub alignment_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,

    pub explanation: String,

    #[serde(default)]
    pub score_factors: Vec<ScoreFactor>,
}

impl AnalysisResult {
    pub fn count_by_severity(&self) -> SeverityCount {
        let mut count = SeverityCount::default();
        for flag in &self.flags {
            match flag.severity {
                Severity::High => count.high += 1,
                Severity::Medium => count.medium += 1,
                Severity::Low => count.low += 1,
            }
        }
        count
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeverityCount {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Per-stage progress record. Observability only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub icon: String,
    pub status: StageStatus,
    pub logs: Vec<String>,
}

impl AgentStatus {
    pub fn pending(name: &str, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            status: StageStatus::Pending,
            logs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub analysis: AnalysisResult,
    pub agents: Vec<AgentStatus>,
    pub logs: Vec<String>,
}
