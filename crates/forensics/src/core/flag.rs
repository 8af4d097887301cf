use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

impl Severity {
    /// Lenient parse used at the model boundary. Anything unrecognised is
    /// treated as MEDIUM.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" | "CRITICAL" => Self::High,
            "LOW" | "INFO" | "INFORMATIONAL" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }
}

/// Pipeline stage that raised a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Metadata,
    Privacy,
    Vision,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => write!(f, "Metadata"),
            Self::Privacy => write!(f, "Privacy"),
            Self::Vision => write!(f, "Vision"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicFlag {
    pub layer: Layer,
    pub severity: Severity,
    pub description: String,
    pub confidence: f64,
}

impl ForensicFlag {
    pub fn new(
        layer: Layer,
        severity: Severity,
        description: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            layer,
            severity,
            description: description.into(),
            confidence: clamp_unit(confidence),
        }
    }

    pub fn metadata(severity: Severity, description: impl Into<String>, confidence: f64) -> Self {
        Self::new(Layer::Metadata, severity, description, confidence)
    }

    pub fn privacy(severity: Severity, description: impl Into<String>, confidence: f64) -> Self {
        Self::new(Layer::Privacy, severity, description, confidence)
    }

    pub fn vision(severity: Severity, description: impl Into<String>, confidence: f64) -> Self {
        Self::new(Layer::Vision, severity, description, confidence)
    }

    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Clamps to [0.0, 1.0]; NaN becomes 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
