//! Sentinel Forensics - Payment Receipt Forgery Detection
//!
//! Runs a fixed three-stage pipeline over a buyer-submitted receipt image:
//! tag-data inspection, OCR-driven redaction, and remote visual forensics on
//! the redacted copy. The stage results reduce to a bounded risk score and an
//! APPROVE / REVIEW / REJECT verdict.

pub mod analyzers;
pub mod core;
pub mod input;
pub mod llm;
pub mod logging;
pub mod runner;

pub use crate::core::{
    AnalysisResult, BankProvider, ForensicFlag, Layer, PipelineError, PipelineOutcome,
    RiskScorer, Severity, TransactionContext, Verdict,
};

pub use analyzers::{ExifMetadataAnalyzer, PrivacyAgent, VisionAgent};

pub use llm::{ModelFallback, SentinelConfig, VisionProviderFactory};

pub use runner::{Orchestrator, ReportFormat};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
