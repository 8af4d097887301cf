use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{config::ConfigCommand, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Forensic triage for P2P payment receipt images")]
#[command(version)]
#[command(author = "Sentinel Team")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one receipt image against the claimed transaction
    Scan(ScanArgs),

    /// Create or inspect configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::scan::execute(args))
        }
        Commands::Config { subcommand } => subcommand.execute(),
    }
}
