use thiserror::Error;

/// Run-level failures. Everything a stage can recover from is reported
/// through flags instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image is empty")]
    EmptyImage,

    #[error("Image too large: {size} bytes (limit {limit})")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Invalid transaction context: {0}")]
    InvalidContext(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
