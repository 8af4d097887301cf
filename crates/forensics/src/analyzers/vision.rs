//! Visual forensics through the remote model chain.

use crate::core::context::VisionContext;
use crate::core::flag::{clamp_unit, ForensicFlag, Severity};
use crate::core::stage::{VisionForensicsAnalyzer, VisionResult};
use crate::llm::fallback::ModelFallback;
use crate::llm::json::extract_json;
use crate::llm::prompts::build_vision_prompt;
use crate::llm::provider::VisionRequest;
use async_trait::async_trait;
use chrono::Local;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_SCORE: u8 = 100;

pub struct VisionAgent {
    fallback: Arc<ModelFallback>,
    temperature: f32,
    max_tokens: u32,
}

impl VisionAgent {
    pub fn new(fallback: Arc<ModelFallback>) -> Self {
        Self {
            fallback,
            temperature: 0.2,
            max_tokens: 2048,
        }
    }

    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl VisionForensicsAnalyzer for VisionAgent {
    async fn analyze(&self, image: &[u8], context: &VisionContext) -> VisionResult {
        let prompt = build_vision_prompt(context, Local::now());
        let request =
            VisionRequest::new(prompt, image).with_generation(self.temperature, self.max_tokens);

        match self.fallback.analyze(&request).await {
            Ok(response) => {
                let mut result = parse_vision_response(&response.content);
                info!(
                    model = %response.model,
                    suspicious = result.is_suspicious,
                    findings = result.flags.len(),
                    "Vision analysis complete"
                );
                result.model_used = Some(response.model);
                result
            }
            Err(e) => {
                warn!(error = %e, "Vision analysis failed on every candidate");
                VisionResult::failed(e.to_string())
            }
        }
    }

    fn status_log(&self, result: &VisionResult) -> Vec<String> {
        let icon = self.icon();
        let mut logs = vec![
            format!("{} {} initialized...", icon, self.name()),
            format!(
                "{} Sending to model ({})...",
                icon,
                result.model_used.as_deref().unwrap_or("pending")
            ),
            format!("{} Analyzing font consistency...", icon),
            format!("{} Checking alignment patterns...", icon),
            format!("{} Scanning for visual artifacts...", icon),
        ];

        if let Some(failure) = &result.failure {
            logs.push(format!("{} [X] {}", icon, failure));
        } else if result.is_suspicious {
            logs.push(format!("{} [!] SUSPICIOUS PATTERNS DETECTED", icon));
        } else {
            logs.push(format!("{} [OK] No obvious forgery indicators", icon));
        }

        logs
    }
}

/// Reads the model's answer, tolerating prose around the JSON and missing or
/// mistyped fields.
pub fn parse_vision_response(content: &str) -> VisionResult {
    let object = extract_json(content)
        .and_then(|json| serde_json::from_str::<Value>(json).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        });

    let Some(analysis) = object else {
        debug!(response = %content, "Unparseable vision response");
        let mut result = VisionResult::neutral();
        result.explanation = "AI Analysis Error: Could not parse response.".to_string();
        result.flags.push(ForensicFlag::vision(
            Severity::Low,
            "Could not parse structured AI response",
            0.3,
        ));
        return result;
    };

    let confidence = analysis
        .get("confidence")
        .and_then(Value::as_f64)
        .map(clamp_unit)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let flags = analysis
        .get("findings")
        .and_then(Value::as_array)
        .map(|findings| {
            findings
                .iter()
                .map(|finding| finding_flag(finding, confidence))
                .collect()
        })
        .unwrap_or_default();

    VisionResult {
        is_suspicious: read_bool(&analysis, "is_suspicious"),
        confidence,
        font_consistency_score: read_score(&analysis, "font_consistency_score"),
        alignment_score: read_score(&analysis, "alignment_score"),
        explanation: analysis
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        model_used: None,
        flags,
        failure: None,
    }
}

fn finding_flag(finding: &Value, confidence: f64) -> ForensicFlag {
    let (issue, severity) = match finding {
        Value::Object(map) => (
            map.get("issue").and_then(Value::as_str),
            map.get("severity")
                .and_then(Value::as_str)
                .map(Severity::parse_lenient)
                .unwrap_or(Severity::Medium),
        ),
        Value::String(text) => (Some(text.as_str()), Severity::Medium),
        _ => (None, Severity::Medium),
    };

    ForensicFlag::vision(severity, issue.unwrap_or("Unknown issue"), confidence)
}

fn read_bool(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn read_score(map: &Map<String, Value>, key: &str) -> u8 {
    map.get(key)
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(DEFAULT_SCORE)
}
