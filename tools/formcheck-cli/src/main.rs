//! FormCheck CLI: exercise-form analysis from pose keypoint files.
//!
//! Usage:
//!   formcheck skills                                  List registered exercises
//!   formcheck analyze <EXERCISE> --clip <VIEW>=<PATH> Analyze a session
//!   formcheck validate <PATH>                         Check a pose file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formcheck_common::{logging::init_logging, AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "formcheck",
    about = "Biomechanical form analysis for strength exercises",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered exercises and the camera views they accept
    Skills,

    /// Analyze one session of an exercise
    Analyze {
        /// Exercise name (see `formcheck skills`)
        exercise: String,

        /// Pose file for a view slot, as VIEW=PATH (repeatable)
        #[arg(short, long = "clip", value_name = "VIEW=PATH", required = true)]
        clips: Vec<String>,

        /// Knowledge-base directory (overrides config)
        #[arg(long)]
        kb_dir: Option<PathBuf>,

        /// Smoothing factor in (0, 1] (overrides config)
        #[arg(long)]
        alpha: Option<f64>,

        /// Feedback mode: kb or angles-only
        #[arg(long, default_value = "kb")]
        mode: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a pose file
    Validate {
        /// Path to a JSON or JSONL pose file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load();

    // Initialize logging
    let log_config = LoggingConfig {
        level: if cli.verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        },
        ..config.logging.clone()
    };
    init_logging(&log_config)?;

    match cli.command {
        Commands::Skills => commands::skills::run(),
        Commands::Analyze {
            exercise,
            clips,
            kb_dir,
            alpha,
            mode,
            json,
        } => commands::analyze::run(config, exercise, clips, kb_dir, alpha, mode, json).await,
        Commands::Validate { path } => commands::validate::run(path),
    }
}
