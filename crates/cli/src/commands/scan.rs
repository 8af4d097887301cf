//! Single-receipt analysis

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::*;
use rust_decimal::Decimal;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use sentinel_forensics::{
    analyzers::{PrivacyAgent, StaticTextEngine},
    core::{PipelineOutcome, Severity, StageStatus, Verdict},
    input::load_image,
    llm::ProviderConfig,
    logging::{init_tracing, init_tracing_json},
    BankProvider, Orchestrator, ReportFormat, SentinelConfig, TransactionContext,
};

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Receipt image (PNG, JPEG, WebP, GIF, BMP, TIFF, HEIC)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Amount the buyer claims to have paid
    #[arg(short, long)]
    pub amount: Decimal,

    /// Expected payment provider; unrecognised names become "unknown"
    #[arg(short, long, default_value = "unknown")]
    pub bank: String,

    #[arg(long)]
    pub sender: Option<String>,

    /// Claimed transaction time, passed to the vision model verbatim
    #[arg(long)]
    pub time: Option<String>,

    /// Image file holds base64 text or a data URL
    #[arg(long)]
    pub base64: bool,

    /// Transcript to use as OCR output
    #[arg(long)]
    pub ocr_text: Option<PathBuf>,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use the simulated vision backend
    #[arg(long)]
    pub offline: bool,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(short, long, default_value = "console")]
    pub format: ReportFormat,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn execute(args: ScanArgs) -> Result<()> {
    let start = Instant::now();

    let level = if args.verbose { "debug" } else { "warn" };
    if args.log_json {
        init_tracing_json(level);
    } else {
        init_tracing(level);
    }

    let mut config = SentinelConfig::load(args.config.as_deref())?;
    if args.offline {
        config.provider = ProviderConfig::Simulated;
    }

    let image = load_image(&args.image, args.base64, config.limits.max_image_bytes)
        .with_context(|| format!("Cannot use image {}", args.image.display()))?;

    let mut context = TransactionContext::new(args.amount, BankProvider::parse_lenient(&args.bank))?;
    if let Some(sender) = &args.sender {
        context = context.with_sender(sender.clone());
    }
    if let Some(time) = &args.time {
        context = context.with_transaction_time(time.clone());
    }

    let privacy = match &args.ocr_text {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read OCR transcript: {}", path.display()))?;
            PrivacyAgent::new().with_ocr(Arc::new(StaticTextEngine::new(text)))
        }
        None => PrivacyAgent::new(),
    };

    let orchestrator = Orchestrator::from_config(&config, privacy);

    let outcome = match args.timeout {
        Some(seconds) => tokio::time::timeout(
            Duration::from_secs(seconds),
            orchestrator.run(&image, &context),
        )
        .await
        .map_err(|_| anyhow!("Analysis timed out after {} seconds", seconds))??,
        None => orchestrator.run(&image, &context).await?,
    };

    info!(
        verdict = %outcome.analysis.verdict,
        score = outcome.analysis.risk_score,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Scan finished"
    );

    if args.output.is_some() {
        colored::control::set_override(false);
    }

    let output = match args.format {
        ReportFormat::Console => generate_console_output(&outcome, args.verbose)?,
        ReportFormat::Json => outcome.to_json()?,
        ReportFormat::Markdown => outcome.to_markdown(),
    };

    if let Some(output_path) = &args.output {
        std::fs::write(output_path, output)
            .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
    } else {
        println!("{}", output);
    }

    if args.verbose {
        eprintln!("⏱️  Time: {:.2}s", start.elapsed().as_secs_f64());
    }

    Ok(())
}

fn verdict_label(verdict: Verdict) -> ColoredString {
    match verdict {
        Verdict::Approve => "APPROVE".green().bold(),
        Verdict::Review => "REVIEW".yellow().bold(),
        Verdict::Reject => "REJECT".red().bold(),
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => "HIGH".bright_red(),
        Severity::Medium => "MEDIUM".yellow(),
        Severity::Low => "LOW".bright_yellow(),
    }
}

fn generate_console_output(outcome: &PipelineOutcome, verbose: bool) -> Result<String> {
    let analysis = &outcome.analysis;
    let mut output = String::new();

    writeln!(&mut output, "\n{}", "════════════════════════════════════════".bright_blue())?;
    writeln!(&mut output, "{}", "     RECEIPT FORENSICS REPORT".bright_blue().bold())?;
    writeln!(&mut output, "{}", "════════════════════════════════════════".bright_blue())?;

    writeln!(
        &mut output,
        "\n{} {}   Risk score: {}/100",
        analysis.verdict.emoji(),
        verdict_label(analysis.verdict),
        analysis.risk_score.to_string().bold()
    )?;

    let amount = match (&analysis.amount_detected, analysis.amount_match) {
        (Some(detected), true) => format!("{} {}", detected, "(matches claim)".green()),
        (Some(detected), false) => format!("{} {}", detected, "(MISMATCH)".red().bold()),
        (None, _) => "not detected".bright_black().to_string(),
    };

    writeln!(&mut output, "\n{} Signals", "▶".bright_white())?;
    writeln!(&mut output, "{}", "─".repeat(40).bright_black())?;
    writeln!(&mut output, "  Amount:           {}", amount)?;
    writeln!(
        &mut output,
        "  Software:         {}",
        analysis.software_detected.as_deref().unwrap_or("none")
    )?;
    writeln!(
        &mut output,
        "  Device:           {}",
        analysis.hardware_detected.as_deref().unwrap_or("unknown")
    )?;
    writeln!(&mut output, "  Font consistency: {}", analysis.font_consistency_score)?;
    writeln!(&mut output, "  Alignment:        {}", analysis.alignment_score)?;
    writeln!(
        &mut output,
        "  Model:            {}",
        analysis.model_used.as_deref().unwrap_or("none")
    )?;

    if !analysis.flags.is_empty() {
        writeln!(
            &mut output,
            "\n{} Flags ({})",
            "▶".bright_white(),
            analysis.flags.len()
        )?;
        writeln!(&mut output, "{}", "─".repeat(40).bright_black())?;
        for flag in &analysis.flags {
            writeln!(
                &mut output,
                "  {} {} [{}] {} {}",
                "•".bright_white(),
                severity_label(flag.severity),
                flag.layer,
                flag.description,
                format!("({:.2})", flag.confidence).bright_black()
            )?;
        }
    }

    if !analysis.score_factors.is_empty() {
        writeln!(&mut output, "\n{} Score breakdown", "▶".bright_white())?;
        writeln!(&mut output, "{}", "─".repeat(40).bright_black())?;
        for factor in &analysis.score_factors {
            writeln!(
                &mut output,
                "  {} {}",
                format!("+{:>3}", factor.points()).bold(),
                factor.describe()
            )?;
        }
    }

    writeln!(&mut output, "\n{} Explanation", "▶".bright_white())?;
    writeln!(&mut output, "{}", "─".repeat(40).bright_black())?;
    writeln!(&mut output, "  {}", analysis.explanation)?;

    if verbose {
        writeln!(&mut output, "\n{} Agents", "▶".bright_white())?;
        writeln!(&mut output, "{}", "─".repeat(40).bright_black())?;
        for agent in &outcome.agents {
            let status = match agent.status {
                StageStatus::Complete => agent.status.to_string().green(),
                StageStatus::Error => agent.status.to_string().red(),
                _ => agent.status.to_string().normal(),
            };
            writeln!(&mut output, "  {} {} ({})", agent.icon, agent.name, status)?;
        }
        writeln!(&mut output)?;
        for line in &outcome.logs {
            writeln!(&mut output, "  {}", line.bright_black())?;
        }
    }

    Ok(output)
}
