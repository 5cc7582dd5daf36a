//! Sightline - season-summary record validation CLI
//!
//! The `sightline` command validates JSON-lines season-summary records
//! against the static field rules and, unless run offline, the upstream
//! taxonomy/geography service.
//!
//! ## Commands
//!
//! - `validate`: Validate records from a file or stdin, one JSON object
//!   per line; results are written to stdout the same way
//! - `ping`: Check that the upstream service is reachable

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sightline_core::{validate_records, Record, RecordValidationResult};
use sightline_runtime::{
    INaturalistProvider, RuntimeConfig, TaxonomyProvider, ValidationOrchestrator,
};

#[derive(Parser)]
#[command(name = "sightline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate biodiversity season-summary records", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate records (JSON lines in, JSON lines out)
    Validate {
        /// Input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Runtime configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip upstream verification; static rules only
        #[arg(long)]
        offline: bool,

        /// Surface ambiguity instead of picking the first exact match
        #[arg(long)]
        strict: bool,
    },

    /// Check that the upstream service is reachable
    Ping,
}

/// One output line per input record.
#[derive(Serialize)]
struct OutputRow {
    #[serde(flatten)]
    result: RecordValidationResult,
    /// The record with auto-applied corrections written back.
    corrected: Record,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            input,
            config,
            offline,
            strict,
        } => {
            let records = read_records(&input)?;
            let results = if offline {
                validate_records(&records)
            } else {
                let mut config = load_config(config.as_deref())?;
                config.strict_resolution = strict;
                let provider = Arc::new(INaturalistProvider::new());
                let orchestrator = ValidationOrchestrator::new(provider, config);
                orchestrator.begin_run();
                orchestrator.validate_batch(&records).await
            };
            tracing::info!(records = records.len(), offline, "Validation complete");
            write_results(records, results)?;
        }
        Commands::Ping => {
            let provider = INaturalistProvider::new();
            if provider.health_check().await {
                println!("ok: {} reachable", provider.name());
            } else {
                anyhow::bail!("{} unreachable", provider.name());
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening config {}", path.display()))?;
            serde_yaml::from_reader(file)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(RuntimeConfig::default()),
    }
}

fn read_records(input: &str) -> Result<Vec<Record>> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(
            File::open(input).with_context(|| format!("opening input {input}"))?,
        ))
    };

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)
            .with_context(|| format!("parsing record on line {}", line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn write_results(records: Vec<Record>, results: Vec<RecordValidationResult>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for result in results {
        let corrected = match records.get(result.row_index) {
            Some(record) => result.apply_to(record),
            None => Record::default(),
        };
        let row = OutputRow { result, corrected };
        serde_json::to_writer(&mut out, &row).context("serializing result")?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
