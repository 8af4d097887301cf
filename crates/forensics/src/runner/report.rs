use crate::core::PipelineOutcome;
use anyhow::Result;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("Unknown report format: {}", other)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl PipelineOutcome {
    /// The analysis result only; stage logs are a display concern.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.analysis)?)
    }

    pub fn to_markdown(&self) -> String {
        let analysis = &self.analysis;
        let mut md = String::from("# Receipt Analysis\n\n");

        md.push_str(&format!(
            "**Verdict:** {} {}\n",
            analysis.verdict.emoji(),
            analysis.verdict
        ));
        md.push_str(&format!("**Risk score:** {}/100\n\n", analysis.risk_score));

        md.push_str("## Signals\n\n");
        md.push_str(&format!(
            "- Software: {}\n",
            analysis.software_detected.as_deref().unwrap_or("none")
        ));
        md.push_str(&format!(
            "- Device: {}\n",
            analysis.hardware_detected.as_deref().unwrap_or("unknown")
        ));
        md.push_str(&format!("- Edited: {}\n", analysis.is_edited));
        md.push_str(&format!(
            "- Amount detected: {}\n",
            analysis.amount_detected.as_deref().unwrap_or("n/a")
        ));
        md.push_str(&format!("- Amount match: {}\n", analysis.amount_match));
        md.push_str(&format!(
            "- Font consistency: {}\n",
            analysis.font_consistency_score
        ));
        md.push_str(&format!("- Alignment: {}\n", analysis.alignment_score));
        md.push_str(&format!(
            "- Model: {}\n\n",
            analysis.model_used.as_deref().unwrap_or("none")
        ));

        if !analysis.score_factors.is_empty() {
            md.push_str("## Score Breakdown\n\n");
            for factor in &analysis.score_factors {
                md.push_str(&format!("- +{} {}\n", factor.points(), factor.describe()));
            }
            md.push('\n');
        }

        let count = analysis.count_by_severity();
        md.push_str("## Flags\n\n");
        md.push_str(&format!(
            "High: {} | Medium: {} | Low: {}\n\n",
            count.high, count.medium, count.low
        ));

        for flag in &analysis.flags {
            md.push_str(&format!(
                "- {} **{}** [{}] {} (confidence {:.2})\n",
                flag.severity.emoji(),
                flag.severity,
                flag.layer,
                flag.description,
                flag.confidence
            ));
        }
        if !analysis.flags.is_empty() {
            md.push('\n');
        }

        md.push_str("## Explanation\n\n");
        md.push_str(&analysis.explanation);
        md.push_str("\n\n");

        if !self.logs.is_empty() {
            md.push_str("## Agent Log\n\n```\n");
            for line in &self.logs {
                md.push_str(line);
                md.push('\n');
            }
            md.push_str("```\n");
        }

        md
    }
}
