//! Data model, stage contracts and scoring for the receipt forensics pipeline
//!
//! Flags are the evidence trail every stage contributes to. Stage results carry
//! the structured signals the scorer reduces to a bounded risk score, and the
//! transaction context is the caller's claim the receipt is checked against.

pub mod context;
pub mod error;
pub mod flag;
pub mod result;
pub mod scoring;
pub mod stage;

pub use context::{BankProvider, TransactionContext, VisionContext};
pub use error::PipelineError;
pub use flag::{ForensicFlag, Layer, Severity};
pub use result::{AgentStatus, AnalysisResult, PipelineOutcome, SeverityCount, StageStatus};
pub use scoring::{amount_matches, parse_amount, RiskAssessment, RiskScorer, ScoreFactor, Verdict};
pub use stage::{
    MetaResult, MetadataAnalyzer, PrivacyResult, TextPrivacyAnalyzer, VisionForensicsAnalyzer,
    VisionResult,
};
