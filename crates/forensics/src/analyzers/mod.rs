//! Concrete stage analyzers: tag data, on-image text, and visual forensics.

pub mod metadata;
pub mod privacy;
pub mod vision;

pub use metadata::ExifMetadataAnalyzer;
pub use privacy::{OcrEngine, PrivacyAgent, Redactor, StaticTextEngine};
pub use vision::VisionAgent;
