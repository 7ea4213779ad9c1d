//! schemagen: add missing identity and foreign-key fields to Go structs.
//!
//! Usage:
//!     schemagen ./models --dry-run --json

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use schemagen_core::RunConfig;

const DEFAULT_LOG_FILTER: &str = "schemagen=info,schemagen_core=info";

#[derive(Parser, Debug)]
#[command(
    name = "schemagen",
    about = "Derive ID and foreign-key fields for Go struct declarations"
)]
struct Args {
    /// Directory containing the Go sources
    dir: PathBuf,

    /// Descend into subdirectories
    #[arg(long, short = 'r')]
    recursive: bool,

    /// Report derived fields without rewriting files
    #[arg(long)]
    dry_run: bool,

    /// Also process *_test.go files
    #[arg(long)]
    include_tests: bool,

    /// Glob pattern of files to skip (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Number of files analysed in parallel
    #[arg(long, env = "SCHEMAGEN_WORKERS")]
    workers: Option<usize>,

    /// Print the resulting schema as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("schemagen=debug,schemagen_core=debug")
    } else {
        EnvFilter::try_from_env("SCHEMAGEN_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn config_from(args: &Args) -> RunConfig {
    let mut config = RunConfig::from_env();
    config.discovery.recursive |= args.recursive;
    config.discovery.include_tests |= args.include_tests;
    config.discovery.exclude.extend(args.exclude.iter().cloned());
    config.dry_run |= args.dry_run;
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }
    config
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = config_from(&args);
    let report = schemagen_core::run(&args.dir, &config)
        .with_context(|| format!("Failed to scan {}", args.dir.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report.summary())
            .context("Failed to serialize run summary")?;
        println!("{json}");
    } else {
        for change in &report.changes {
            for derived in &change.derived {
                let fields: Vec<String> = derived.added.iter().map(|f| f.declaration()).collect();
                println!("{}: {} += {}", change.path, derived.record, fields.join(", "));
            }
        }
    }

    match report.into_result() {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
