//! Tessera command-line interface
//!
//! Inspects how the row engine lays out a given list of field types.
//!
//! # Usage
//!
//! ```bash
//! # Show the storage plan of a layout
//! tessera layout "bool, int?, string, uuid"
//!
//! # Force a split at 8 fields
//! tessera layout --max-width 8 "int, int, int, int, int, int, int, int, int"
//!
//! # Print the effective configuration
//! tessera --config tessera.toml config
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tessera_common::{FieldType, TupleConfig};
use tessera_tuple::DescriptorRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod report;

/// Tessera command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    author = "Tessera Team",
    version,
    about = "Layout inspector for the Tessera row engine"
)]
struct Args {
    /// Configuration file path
    #[arg(long, value_name = "FILE", env = "TESSERA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the storage plan of a layout
    Layout {
        /// Comma separated field types, e.g. "bool, int?, string"
        types: String,

        /// Override the maximum specialized width
        #[arg(long)]
        max_width: Option<usize>,

        /// Override the maximum packed words
        #[arg(long)]
        max_words: Option<usize>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let mut config = load_config(&args)?;

    match args.command {
        Command::Layout {
            types,
            max_width,
            max_words,
        } => {
            if let Some(width) = max_width {
                config.max_specialized_width = width;
            }
            if let Some(words) = max_words {
                config.max_packed_words = words;
            }
            show_layout(config, &types)
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tessera_cli=debug,tessera_tuple=debug")
    } else {
        EnvFilter::new("tessera_cli=warn,tessera_tuple=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(args: &Args) -> Result<TupleConfig> {
    match &args.config {
        Some(path) => TupleConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(TupleConfig::default()),
    }
}

fn show_layout(config: TupleConfig, types: &str) -> Result<()> {
    let fields = FieldType::parse_list(types)?;
    let registry = DescriptorRegistry::new(config)?;

    let descriptor = registry.create(&fields);
    let report = registry.shutdown();
    info!(
        layouts = registry.len(),
        failed = report.failed.len(),
        "specialized layout"
    );

    print!("{}", report::render(&descriptor));
    Ok(())
}
