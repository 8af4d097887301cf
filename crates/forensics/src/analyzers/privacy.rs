//! OCR-driven sensitive-field detection, redaction and amount extraction.
//!
//! Text recognition and pixel redaction are pluggable backends. When either
//! is missing the agent still runs and reports the gap as a LOW flag; the
//! orchestrator then forwards the original bytes.

use crate::core::flag::{ForensicFlag, Severity};
use crate::core::stage::{PrivacyResult, TextPrivacyAnalyzer};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PrivacyError {
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Redaction failed: {0}")]
    Redaction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    AccountNumber,
    Phone,
    Cnic,
    Email,
}

static PII_PATTERNS: Lazy<Vec<(PiiKind, Regex)>> = Lazy::new(|| {
    [
        (PiiKind::AccountNumber, r"\b\d{10,16}\b"),
        (PiiKind::Phone, r"\b03\d{9}\b"),
        (PiiKind::Cnic, r"\b\d{5}-\d{7}-\d\b"),
        (PiiKind::Email, r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("static PII pattern")))
    .collect()
});

static AMOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:PKR|Rs\.?|₨)\s*([\d,]+(?:\.\d{2})?)",
        r"(?i)(?:Amount|Total|Paid)\s*:?\s*([\d,]+(?:\.\d{2})?)",
        r"(?i)\b(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s*(?:PKR|Rs)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("static amount pattern"))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrWord {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub words: Vec<OcrWord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RedactionBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub kind: PiiKind,
}

pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(&self, image: &[u8]) -> Result<OcrOutput, PrivacyError>;
}

pub trait Redactor: Send + Sync {
    /// Returns new image bytes with every box obscured.
    fn redact(&self, image: &[u8], boxes: &[RedactionBox]) -> Result<Vec<u8>, PrivacyError>;
}

/// Serves a fixed transcript regardless of the image, one zero-sized box per word.
#[derive(Debug, Clone)]
pub struct StaticTextEngine {
    text: String,
}

impl StaticTextEngine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrEngine for StaticTextEngine {
    fn name(&self) -> &str {
        "static"
    }

    fn recognize(&self, _image: &[u8]) -> Result<OcrOutput, PrivacyError> {
        Ok(OcrOutput {
            text: self.text.clone(),
            words: self
                .text
                .split_whitespace()
                .map(|w| OcrWord::new(w, 0, 0, 0, 0))
                .collect(),
        })
    }
}

pub fn classify_sensitive(text: &str) -> Option<PiiKind> {
    PII_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(kind, _)| *kind)
}

pub fn find_sensitive_regions(words: &[OcrWord]) -> Vec<RedactionBox> {
    words
        .iter()
        .filter_map(|word| {
            let text = word.text.trim();
            if text.is_empty() {
                return None;
            }
            classify_sensitive(text).map(|kind| RedactionBox {
                left: word.left,
                top: word.top,
                width: word.width,
                height: word.height,
                kind,
            })
        })
        .collect()
}

/// First pattern that matches wins; thousands separators are removed.
pub fn extract_amount(text: &str) -> Option<String> {
    AMOUNT_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace(',', ""))
    })
}

#[derive(Clone, Default)]
pub struct PrivacyAgent {
    ocr: Option<Arc<dyn OcrEngine>>,
    redactor: Option<Arc<dyn Redactor>>,
}

impl PrivacyAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn with_redactor(mut self, redactor: Arc<dyn Redactor>) -> Self {
        self.redactor = Some(redactor);
        self
    }

    fn scan(&self, ocr: &dyn OcrEngine, image: &[u8]) -> Result<PrivacyResult, PrivacyError> {
        let output = ocr.recognize(image)?;
        let boxes = find_sensitive_regions(&output.words);

        let mut result = PrivacyResult {
            amount_detected: extract_amount(&output.text),
            ..Default::default()
        };

        debug!(
            engine = ocr.name(),
            words = output.words.len(),
            regions = boxes.len(),
            "OCR complete"
        );

        if boxes.is_empty() {
            result.redacted_image = Some(image.to_vec());
            return Ok(result);
        }

        match &self.redactor {
            Some(redactor) => {
                result.redacted_image = Some(redactor.redact(image, &boxes)?);
                result.regions_redacted = boxes.len();
                info!(regions = boxes.len(), "Sensitive regions redacted");
            }
            None => {
                warn!(regions = boxes.len(), "No redaction backend configured");
                result.flags.push(ForensicFlag::privacy(
                    Severity::Low,
                    format!(
                        "Redaction backend unavailable; {} sensitive regions left unredacted",
                        boxes.len()
                    ),
                    0.5,
                ));
            }
        }

        Ok(result)
    }
}

impl TextPrivacyAnalyzer for PrivacyAgent {
    fn analyze(&self, image: &[u8]) -> PrivacyResult {
        let Some(ocr) = self.ocr.as_deref() else {
            warn!("OCR engine not configured, skipping privacy redaction");
            return PrivacyResult {
                flags: vec![ForensicFlag::privacy(
                    Severity::Low,
                    "OCR engine not found. Privacy redaction skipped.",
                    0.5,
                )],
                ..Default::default()
            };
        };

        self.scan(ocr, image).unwrap_or_else(|e| {
            warn!(error = %e, "Privacy scan failed");
            PrivacyResult {
                flags: vec![ForensicFlag::privacy(
                    Severity::Low,
                    format!("Privacy scan error: {}", e),
                    0.3,
                )],
                ..Default::default()
            }
        })
    }

    fn status_log(&self, result: &PrivacyResult) -> Vec<String> {
        let icon = self.icon();
        let mut logs = vec![
            format!("{} {} initialized...", icon, self.name()),
            format!("{} Running OCR text extraction...", icon),
        ];

        if result.regions_redacted > 0 {
            logs.push(format!(
                "{} Detected {} PII regions",
                icon, result.regions_redacted
            ));
            logs.push(format!("{} Applying blur redaction...", icon));
        } else {
            logs.push(format!("{} No PII patterns detected", icon));
        }

        if let Some(amount) = &result.amount_detected {
            logs.push(format!("{} Amount extracted: {}", icon, amount));
        }

        logs.push(format!("{} [OK] Privacy-safe image prepared", icon));
        logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flag::Layer;

    struct FailingOcr;

    impl OcrEngine for FailingOcr {
        fn name(&self) -> &str {
            "failing"
        }

        fn recognize(&self, _image: &[u8]) -> Result<OcrOutput, PrivacyError> {
            Err(PrivacyError::Ocr("tesseract crashed".to_string()))
        }
    }

    struct MarkingRedactor;

    impl Redactor for MarkingRedactor {
        fn redact(&self, image: &[u8], boxes: &[RedactionBox]) -> Result<Vec<u8>, PrivacyError> {
            let mut out = image.to_vec();
            out.extend(std::iter::repeat(0xAA).take(boxes.len()));
            Ok(out)
        }
    }

    #[test]
    fn test_amount_patterns() {
        assert_eq!(extract_amount("Sent PKR 5,000.00 to Ali").as_deref(), Some("5000.00"));
        assert_eq!(extract_amount("rs. 750").as_deref(), Some("750"));
        assert_eq!(extract_amount("Amount: 12,500").as_deref(), Some("12500"));
        assert_eq!(extract_amount("3,000 Rs only").as_deref(), Some("3000"));
        assert_eq!(extract_amount("Transaction successful"), None);
    }

    #[test]
    fn test_currency_prefix_wins_over_label() {
        assert_eq!(
            extract_amount("Total: 100 Fee PKR 25").as_deref(),
            Some("25")
        );
    }

    #[test]
    fn test_sensitive_classification() {
        assert_eq!(classify_sensitive("1234567890123"), Some(PiiKind::AccountNumber));
        assert_eq!(classify_sensitive("35202-1234567-1"), Some(PiiKind::Cnic));
        assert_eq!(classify_sensitive("ali@example.com"), Some(PiiKind::Email));
        assert_eq!(classify_sensitive("5000"), None);
        // 11 digits satisfy the account pattern first
        assert_eq!(classify_sensitive("03001234567"), Some(PiiKind::AccountNumber));
    }

    #[test]
    fn test_missing_ocr_engine() {
        let result = PrivacyAgent::new().analyze(b"image");

        assert!(result.redacted_image.is_none());
        assert!(result.amount_detected.is_none());
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].layer, Layer::Privacy);
        assert_eq!(
            result.flags[0].description,
            "OCR engine not found. Privacy redaction skipped."
        );
    }

    #[test]
    fn test_ocr_failure_is_absorbed() {
        let agent = PrivacyAgent::new().with_ocr(Arc::new(FailingOcr));
        let result = agent.analyze(b"image");

        assert!(result.redacted_image.is_none());
        assert_eq!(result.flags[0].severity, Severity::Low);
        assert_eq!(
            result.flags[0].description,
            "Privacy scan error: OCR failed: tesseract crashed"
        );
    }

    #[test]
    fn test_regions_without_redactor() {
        let engine = StaticTextEngine::new("To 1234567890 PKR 5000");
        let result = PrivacyAgent::new().with_ocr(Arc::new(engine)).analyze(b"image");

        assert!(result.redacted_image.is_none());
        assert_eq!(result.amount_detected.as_deref(), Some("5000"));
        assert_eq!(result.regions_redacted, 0);
        assert_eq!(
            result.flags[0].description,
            "Redaction backend unavailable; 1 sensitive regions left unredacted"
        );
    }

    #[test]
    fn test_regions_redacted() {
        let agent = PrivacyAgent::new()
            .with_ocr(Arc::new(StaticTextEngine::new("ali@example.com 35202-1234567-1")))
            .with_redactor(Arc::new(MarkingRedactor));
        let result = agent.analyze(b"img");

        assert!(result.flags.is_empty());
        assert_eq!(result.regions_redacted, 2);
        assert_eq!(result.redacted_image.as_deref(), Some(&b"img\xAA\xAA"[..]));

        let logs = agent.status_log(&result);
        assert!(logs.contains(&"[PRIV] Detected 2 PII regions".to_string()));
    }

    #[test]
    fn test_clean_text_keeps_image() {
        let agent = PrivacyAgent::new()
            .with_ocr(Arc::new(StaticTextEngine::new("Paid: 900")))
            .with_redactor(Arc::new(MarkingRedactor));
        let result = agent.analyze(b"img");

        assert_eq!(result.redacted_image.as_deref(), Some(&b"img"[..]));
        assert_eq!(result.amount_detected.as_deref(), Some("900"));
    }
}
