//! rageval CLI — score QA / RAG answers with Exact Match and F1.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "rageval",
    version,
    about = "Exact Match and F1 scoring for QA and RAG answers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a run against ground truth
    Eval {
        /// Ground truth file (.json mapping or records, .jsonl records)
        #[arg(long)]
        qrels: PathBuf,

        /// Predictions file (.json mapping or records, .jsonl records)
        #[arg(long)]
        run: PathBuf,

        /// Measures to compute (comma-separated, e.g. "EM,F1")
        #[arg(long)]
        measures: Option<String>,

        /// Print one score per query as well as the aggregate
        #[arg(long)]
        per_query: bool,

        /// Output format: text, json, markdown
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List supported measures
    Measures,

    /// Create a starter config file
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rageval=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            qrels,
            run,
            measures,
            per_query,
            format,
            config,
        } => commands::eval::execute(qrels, run, measures, per_query, format, config),
        Commands::Measures => commands::measures::execute(),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
