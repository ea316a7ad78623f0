//! citekey CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod settings;

#[derive(Parser)]
#[command(name = "citekey")]
#[command(version)]
#[command(about = "Generate citation keys from a key pattern", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a citation key for every record
    Generate {
        /// JSON array of records (reads stdin when omitted)
        records: Option<PathBuf>,

        /// YAML settings file with `citekey-format` and `formatter`
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Use this pattern instead of the configured one
        #[arg(short, long)]
        pattern: Option<String>,

        /// Persist a healed pattern into the settings file
        #[arg(long, requires = "config", conflicts_with = "pattern")]
        write_back: bool,
    },

    /// Compile a pattern and report any error
    Check {
        /// Pattern to compile
        pattern: String,

        /// YAML settings file; its formatter section affects name resolution
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the available functions and filters
    Catalog,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citekey=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            records,
            config,
            pattern,
            write_back,
        } => commands::generate::execute(commands::generate::GenerateArgs {
            records,
            config,
            pattern,
            write_back,
        }),
        Commands::Check { pattern, config } => {
            commands::check::execute(&pattern, config.as_deref())
        }
        Commands::Catalog => commands::catalog::execute(),
    }
}
