mod company;
mod config;
mod detail;
mod error;
mod export;
mod extract;
mod location;
mod models;
mod pipeline;
mod search;
mod snippet;
mod transport;
mod urls;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pipeline::Pipeline;
use transport::HttpTransport;

#[derive(Parser)]
#[command(name = "jobsweep")]
#[command(about = "Scrape public job listings into structured JSON (no login, no cookies)")]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every search, enrich each job, and write the JSON output
    Scrape {
        /// Path to settings JSON file
        #[arg(long, default_value = "config/settings.example.json")]
        settings: PathBuf,

        /// Path to inputs JSON file
        #[arg(long, default_value = "data/inputs.sample.json")]
        inputs: PathBuf,

        /// Path to output JSON file
        #[arg(long, default_value = "data/output.json")]
        output: PathBuf,

        /// Override max concurrent workers (otherwise taken from settings)
        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Show how a location string is split into city, state, and country
    Location {
        /// Free-text location, e.g. "London, England, United Kingdom"
        text: String,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Scrape {
            settings,
            inputs,
            output,
            max_workers,
        } => {
            let settings = config::load_settings(&settings)?;
            let inputs = config::load_inputs(&inputs)?;

            let transport = Arc::new(HttpTransport::new()?);
            let mut pipeline = Pipeline::new(transport, settings.scraper);
            if let Some(workers) = max_workers {
                pipeline = pipeline.with_max_workers(workers);
            }

            let jobs = pipeline.run(&inputs.searches).await;
            export::export_to_json_file(&jobs, &output)?;
            println!("Wrote {} job(s) to {}", jobs.len(), output.display());
        }

        Commands::Location { text } => {
            let parsed = location::normalize_location(&text);
            let json = serde_json::to_string_pretty(&parsed)
                .context("Failed to serialize parsed location")?;
            println!("{}", json);
        }
    }

    Ok(())
}
