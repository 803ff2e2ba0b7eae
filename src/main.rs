use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redaction::default_rules;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pagetrace",
    version,
    about = "DOM session recording with privacy-safe transcript export"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scripted demo session through the pipeline and print the
    /// resulting transcript.
    Demo {
        /// Write the transcript to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the built-in redaction rules.
    Rules,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Demo { out } => {
            let transcript = pagetrace_cli::run_demo().await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, transcript)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("transcript written to {}", path.display());
                }
                None => println!("{transcript}"),
            }
        }
        Command::Rules => {
            for rule in default_rules() {
                println!(
                    "{:<24} {:<12} {:>12}  {}",
                    rule.id,
                    format!("{:?}", rule.kind).to_lowercase(),
                    rule.replacement,
                    rule.name
                );
            }
        }
    }
    Ok(())
}
