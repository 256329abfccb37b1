//! quizrunner CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use quizrunner_core::review::ReviewFilter;

mod commands;
mod config;
mod server;

#[derive(Parser)]
#[command(name = "quizrunner", version, about = "Multiple-choice quiz runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz in the terminal
    Play(commands::play::PlayArgs),

    /// List topics and question counts
    Topics {
        /// Question bank JSON (default: probe configured paths)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question bank
    Validate {
        /// Question bank JSON
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show the review of a saved JSON report
    Review {
        /// Report JSON written by `play`
        #[arg(long)]
        report: PathBuf,

        /// Filter: all, correct, incorrect, unanswered
        #[arg(long, default_value = "all")]
        filter: ReviewFilter,
    },

    /// Compare two saved JSON reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if a previously correct question is now missed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and sample question bank
    Init,

    /// Serve the browser front-end from a local directory
    Serve {
        /// Directory to serve
        #[arg(long)]
        root: Option<PathBuf>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizrunner=info".parse().unwrap())
                .add_directive("tower_http=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play(args) => commands::play::execute(args),
        Commands::Topics { bank, config } => commands::topics::execute(bank, config),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Review { report, filter } => commands::review::execute(report, filter),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
        Commands::Serve { root, port, config } => {
            commands::serve::execute(root, port, config).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
