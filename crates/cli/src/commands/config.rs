use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::PathBuf;

use sentinel_forensics::{llm::EXAMPLE_CONFIG, SentinelConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write an example configuration file
    Init {
        #[arg(short, long, default_value = "sentinel.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration with secrets masked
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                if output.exists() && !force {
                    bail!(
                        "{} already exists; pass --force to overwrite",
                        output.display()
                    );
                }
                std::fs::write(output, EXAMPLE_CONFIG.trim_start())
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                println!("{} Wrote {}", "✓".green(), output.display());
                println!("  Set GEMINI_API_KEY or add provider.api_key before scanning.");
                Ok(())
            }
            Self::Show { config, json } => {
                let loaded = SentinelConfig::load(config.as_deref())?.redacted();
                let rendered = if *json {
                    serde_json::to_string_pretty(&loaded)?
                } else {
                    serde_yaml::to_string(&loaded)?
                };
                println!("{}", rendered);
                Ok(())
            }
        }
    }
}
