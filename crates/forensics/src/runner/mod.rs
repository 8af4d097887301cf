//! Pipeline execution and reporting
//!
//! The orchestrator sequences the three stages over one image, threads the
//! redacted copy into the vision stage and hands every stage result to the
//! scorer. Reports render the outcome for people or machines.

pub mod orchestrator;
pub mod report;

pub use orchestrator::Orchestrator;
pub use report::ReportFormat;
