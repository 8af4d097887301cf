//! Risk scoring.
//!
//! Hard evidence (an editing-software signature, an image that is not a
//! readable receipt, maximal visual suspicion) forces the maximum score.
//! Everything else is additive and clamped at 100.

use crate::core::context::TransactionContext;
use crate::core::stage::{MetaResult, PrivacyResult, VisionResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_SCORE: u8 = 100;

/// Absolute difference at which a detected amount stops matching the claim.
pub const AMOUNT_TOLERANCE: Decimal = dec!(1.0);

const UNREADABLE_THRESHOLD: u8 = 10;
const DEGRADED_THRESHOLD: u8 = 80;

const SUSPICIOUS_POINTS: u32 = 50;
const AMOUNT_MISMATCH_POINTS: u32 = 30;
const FONT_POINTS: u32 = 20;
const ALIGNMENT_POINTS: u32 = 20;
const HIGH_FLAG_POINTS: u32 = 20;

const APPROVE_CEILING: u8 = 20;
const REVIEW_CEILING: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Approve,
    Review,
    Reject,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        if score <= APPROVE_CEILING {
            Self::Approve
        } else if score <= REVIEW_CEILING {
            Self::Review
        } else {
            Self::Reject
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Approve => "✅",
            Self::Review => "⚠️",
            Self::Reject => "⛔",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "APPROVE"),
            Self::Review => write!(f, "REVIEW"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

/// One rule that contributed to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ScoreFactor {
    EditedMetadata,
    UnreadableImage,
    MaximalVisualSuspicion,
    VisualSuspicion,
    AmountMismatch,
    FontInconsistency,
    Misalignment,
    HighSeverityFindings { count: u32 },
}

impl ScoreFactor {
    pub fn points(&self) -> u32 {
        match self {
            Self::EditedMetadata | Self::UnreadableImage | Self::MaximalVisualSuspicion => {
                MAX_SCORE as u32
            }
            Self::VisualSuspicion => SUSPICIOUS_POINTS,
            Self::AmountMismatch => AMOUNT_MISMATCH_POINTS,
            Self::FontInconsistency => FONT_POINTS,
            Self::Misalignment => ALIGNMENT_POINTS,
            Self::HighSeverityFindings { count } => count.saturating_mul(HIGH_FLAG_POINTS),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::EditedMetadata => "Editing software signature in metadata".to_string(),
            Self::UnreadableImage => "Image unreadable or not a receipt".to_string(),
            Self::MaximalVisualSuspicion => "Suspicious with zero font consistency".to_string(),
            Self::VisualSuspicion => "Visual analysis judged the image suspicious".to_string(),
            Self::AmountMismatch => "Detected amount differs from the claim".to_string(),
            Self::FontInconsistency => "Font consistency below 80".to_string(),
            Self::Misalignment => "Alignment below 80".to_string(),
            Self::HighSeverityFindings { count } => {
                format!("{} high-severity visual finding(s)", count)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub verdict: Verdict,
    pub factors: Vec<ScoreFactor>,
}

/// Pure scoring function over the three stage results.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        meta: &MetaResult,
        privacy: &PrivacyResult,
        vision: &VisionResult,
        context: &TransactionContext,
    ) -> u8 {
        self.assess(meta, privacy, vision, context).score
    }

    pub fn assess(
        &self,
        meta: &MetaResult,
        privacy: &PrivacyResult,
        vision: &VisionResult,
        context: &TransactionContext,
    ) -> RiskAssessment {
        if let Some(factor) = Self::immediate_maximum(meta, vision) {
            return RiskAssessment {
                score: MAX_SCORE,
                verdict: Verdict::from_score(MAX_SCORE),
                factors: vec![factor],
            };
        }

        let mut factors = Vec::new();

        if vision.is_suspicious {
            factors.push(ScoreFactor::VisualSuspicion);
        }

        if amount_mismatch(privacy.amount_detected.as_deref(), context.claimed_amount()) {
            factors.push(ScoreFactor::AmountMismatch);
        }

        if vision.font_consistency_score < DEGRADED_THRESHOLD {
            factors.push(ScoreFactor::FontInconsistency);
        }
        if vision.alignment_score < DEGRADED_THRESHOLD {
            factors.push(ScoreFactor::Misalignment);
        }

        let high_flags = vision.high_severity_count() as u32;
        if high_flags > 0 {
            factors.push(ScoreFactor::HighSeverityFindings { count: high_flags });
        }

        let total = factors
            .iter()
            .fold(0u32, |acc, f| acc.saturating_add(f.points()));
        let score = total.min(MAX_SCORE as u32) as u8;

        RiskAssessment {
            score,
            verdict: Verdict::from_score(score),
            factors,
        }
    }

    // Evaluated in priority order; the first match wins.
    fn immediate_maximum(meta: &MetaResult, vision: &VisionResult) -> Option<ScoreFactor> {
        if meta.is_edited {
            return Some(ScoreFactor::EditedMetadata);
        }

        if vision.font_consistency_score < UNREADABLE_THRESHOLD
            && vision.alignment_score < UNREADABLE_THRESHOLD
        {
            return Some(ScoreFactor::UnreadableImage);
        }

        if vision.is_suspicious && vision.font_consistency_score == 0 {
            return Some(ScoreFactor::MaximalVisualSuspicion);
        }

        None
    }
}

/// Parses an extracted amount. `None` means the amount cannot be verified.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// True when the detected amount matches the claim within tolerance, or when
/// it cannot be verified at all. A difference outside `Decimal` range counts
/// as unverifiable.
pub fn amount_matches(detected: Option<&str>, claimed: Decimal) -> bool {
    detected
        .and_then(parse_amount)
        .and_then(|amount| amount.checked_sub(claimed))
        .map(|diff| diff.abs() <= AMOUNT_TOLERANCE)
        .unwrap_or(true)
}

fn amount_mismatch(detected: Option<&str>, claimed: Decimal) -> bool {
    !amount_matches(detected, claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::BankProvider;
    use crate::core::flag::{ForensicFlag, Severity};

    fn context(amount: Decimal) -> TransactionContext {
        TransactionContext::new(amount, BankProvider::JazzCash).unwrap()
    }

    fn clean_vision() -> VisionResult {
        VisionResult {
            font_consistency_score: 95,
            alignment_score: 95,
            ..VisionResult::neutral()
        }
    }

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(Verdict::from_score(0), Verdict::Approve);
        assert_eq!(Verdict::from_score(20), Verdict::Approve);
        assert_eq!(Verdict::from_score(21), Verdict::Review);
        assert_eq!(Verdict::from_score(75), Verdict::Review);
        assert_eq!(Verdict::from_score(76), Verdict::Reject);
        assert_eq!(Verdict::from_score(100), Verdict::Reject);
    }

    #[test]
    fn test_out_of_range_amount_is_unverifiable() {
        assert!(amount_matches(Some("-79228162514264337593543950335"), dec!(1)));
        assert!(amount_matches(Some("79228162514264337593543950335"), dec!(-1)));

        let privacy = PrivacyResult {
            amount_detected: Some("-79228162514264337593543950335".to_string()),
            ..Default::default()
        };
        let score = RiskScorer::new().score(
            &MetaResult::default(),
            &privacy,
            &clean_vision(),
            &context(dec!(1)),
        );
        assert_eq!(score, 0);
    }

    #[test]
    fn test_clean_receipt_scores_zero() {
        let privacy = PrivacyResult {
            amount_detected: Some("5000".to_string()),
            ..Default::default()
        };
        let assessment = RiskScorer::new().assess(
            &MetaResult::default(),
            &privacy,
            &clean_vision(),
            &context(dec!(5000.0)),
        );
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.verdict, Verdict::Approve);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_suspicious_zero_font_is_maximal_regardless_of_alignment() {
        let vision = VisionResult {
            is_suspicious: true,
            font_consistency_score: 0,
            alignment_score: 100,
            ..VisionResult::neutral()
        };
        let assessment = RiskScorer::new().assess(
            &MetaResult::default(),
            &PrivacyResult::default(),
            &vision,
            &context(dec!(10)),
        );
        assert_eq!(assessment.score, 100);
        assert_eq!(assessment.factors, vec![ScoreFactor::MaximalVisualSuspicion]);
    }

    #[test]
    fn test_edited_metadata_takes_priority() {
        let meta = MetaResult {
            is_edited: true,
            ..Default::default()
        };
        let vision = VisionResult {
            font_consistency_score: 0,
            alignment_score: 0,
            ..VisionResult::neutral()
        };
        let assessment = RiskScorer::new().assess(
            &meta,
            &PrivacyResult::default(),
            &vision,
            &context(dec!(10)),
        );
        assert_eq!(assessment.factors, vec![ScoreFactor::EditedMetadata]);
    }

    #[test]
    fn test_high_flags_accumulate_past_cap() {
        let mut vision = clean_vision();
        for i in 0..7 {
            vision
                .flags
                .push(ForensicFlag::vision(Severity::High, format!("defect {}", i), 0.9));
        }
        let assessment = RiskScorer::new().assess(
            &MetaResult::default(),
            &PrivacyResult::default(),
            &vision,
            &context(dec!(10)),
        );
        assert_eq!(
            assessment.factors,
            vec![ScoreFactor::HighSeverityFindings { count: 7 }]
        );
        assert_eq!(assessment.score, 100);
    }

    #[test]
    fn test_medium_flags_do_not_score() {
        let mut vision = clean_vision();
        vision
            .flags
            .push(ForensicFlag::vision(Severity::Medium, "slight blur", 0.6));
        let score = RiskScorer::new().score(
            &MetaResult::default(),
            &PrivacyResult::default(),
            &vision,
            &context(dec!(10)),
        );
        assert_eq!(score, 0);
    }

    #[test]
    fn test_amount_tolerance() {
        assert!(amount_matches(Some("100.5"), dec!(100.0)));
        assert!(amount_matches(Some("99.5"), dec!(100.0)));
        assert!(amount_matches(Some("101.0"), dec!(100.0)));
        assert!(!amount_matches(Some("102.0"), dec!(100.0)));
        assert!(!amount_matches(Some("98"), dec!(100.0)));
        assert!(amount_matches(Some("5,000.00"), dec!(5000)));
    }

    #[test]
    fn test_unverifiable_amount_assumed_match() {
        assert!(amount_matches(None, dec!(100)));
        assert!(amount_matches(Some(""), dec!(100)));
        assert!(amount_matches(Some("12abc"), dec!(100)));
    }
}
