//! melodic - build vocabularies and encode, decode and window scores
//!
//! Subcommands:
//! - `melodic vocab build <scores...>` - Build and save a vocabulary
//! - `melodic encode <score.json>` - Encode a score with a saved vocabulary
//! - `melodic decode <encoded.json>` - Decode events or rows back to a score
//! - `melodic windows <encoded.json>` - Cut training windows from encoded events
//! - `melodic config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use melodic_conf::MelodicConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "melodic")]
#[command(about = "Vocabulary-constrained event codec for symbolic music")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./melodic.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error); overrides config and RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vocabulary management
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },

    /// Encode a score JSON file to events (or rows)
    Encode {
        /// Score JSON file
        score: PathBuf,

        /// Vocabulary directory (defaults to paths.vocab_dir)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Vocabulary partition prefix (e.g. major, minor)
        #[arg(long)]
        prefix: Option<String>,

        /// Emit numeric rows in the configured channel layout
        #[arg(long)]
        rows: bool,
    },

    /// Decode encoded events or rows back to a score
    Decode {
        /// Encoded JSON file: an events object or an array of rows
        encoded: PathBuf,

        /// Vocabulary directory (defaults to paths.vocab_dir)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Vocabulary partition prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Cut sliding training windows from encoded events
    Windows {
        /// Encoded events JSON file
        encoded: PathBuf,

        /// Window length (defaults to codec.sequence_length)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Subcommand)]
enum VocabAction {
    /// Build a vocabulary from score files and save it
    Build {
        /// Score JSON files
        #[arg(required = true)]
        scores: Vec<PathBuf>,

        /// Output directory (defaults to paths.vocab_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Partition prefix for the map file names
        #[arg(long)]
        prefix: Option<String>,

        /// Collect keys from scores in parallel
        #[arg(long)]
        parallel: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = MelodicConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let filter = cli
        .log_level
        .as_deref()
        .unwrap_or(config.telemetry.log_level.as_str());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    match cli.command {
        Commands::Vocab { action } => match action {
            VocabAction::Build {
                scores,
                out,
                prefix,
                parallel,
            } => {
                let dir = out.unwrap_or_else(|| config.paths.vocab_dir.clone());
                let vocab = commands::build_vocab(
                    &scores,
                    &dir,
                    prefix.as_deref(),
                    parallel,
                    &config.codec,
                )?;
                println!(
                    "Built vocabulary of {} keys from {} scores into {}",
                    vocab.len(),
                    scores.len(),
                    dir.display()
                );
            }
        },
        Commands::Encode {
            score,
            vocab,
            prefix,
            rows,
        } => {
            let dir = vocab.unwrap_or_else(|| config.paths.vocab_dir.clone());
            let output = commands::encode(&score, &dir, prefix.as_deref(), rows, &config.codec)?;
            println!("{}", output);
        }
        Commands::Decode {
            encoded,
            vocab,
            prefix,
        } => {
            let dir = vocab.unwrap_or_else(|| config.paths.vocab_dir.clone());
            let output = commands::decode(&encoded, &dir, prefix.as_deref(), &config.codec)?;
            println!("{}", output);
        }
        Commands::Windows { encoded, length } => {
            let length = length.unwrap_or(config.codec.sequence_length);
            let output = commands::windows(&encoded, length)?;
            println!("{}", output);
        }
        Commands::Config => {
            print!("{}", config.to_toml());
        }
    }

    Ok(())
}
