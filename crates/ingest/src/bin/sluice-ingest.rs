//! sluice-ingest: move relational tables into the lake.
//!
//! Reads a TOML job file (one source, one sink, a list of tables) and ingests
//! each table in turn. The first failing table stops the run with a nonzero
//! exit code.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use sluice_core::config::load_dotenv;
use sluice_core::{Config, Credentials, JobFile, TableEntry};
use sluice_ingest::{plan_table, process_table, table_mode, IngestionMode, LakeEngine, TableRequest};
use sluice_storage::StorageBackend;

// ── CLI ─────────────────────────────────────────────────────────────

/// Ingest relational tables into a columnar data lake.
#[derive(Parser, Debug)]
#[command(name = "sluice-ingest", version, about)]
struct Cli {
    /// Path to the TOML job file.
    #[arg(long, env = "SLUICE_JOB")]
    job: String,

    /// Path to a flat TOML file of source credentials.
    #[arg(long, env = "SLUICE_CREDENTIALS")]
    credentials: Option<String>,

    /// Ingestion mode for tables without their own `mode` option.
    #[arg(long)]
    mode: Option<String>,

    /// Output format (`parquet`, `csv`, `json`, `avro`).
    #[arg(long)]
    format: Option<String>,

    /// Output root; tables land under `<location>/<tableName>`.
    #[arg(long)]
    location: Option<String>,

    /// Registered schema root.
    #[arg(long)]
    schemas_location: Option<String>,

    /// Only ingest the named tables (repeatable).
    #[arg(long = "table")]
    tables: Vec<String>,

    /// Resolve and print each table's plan without reading or writing.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// CLI flags win over the job file; the job file wins over defaults.
    fn request(&self, job: &JobFile) -> TableRequest {
        let pick = |flag: &Option<String>, file: &Option<String>, default: &str| {
            flag.clone()
                .or_else(|| file.clone())
                .unwrap_or_else(|| default.to_string())
        };
        TableRequest {
            mode: IngestionMode::parse(&pick(&self.mode, &job.mode, "full")),
            format: pick(&self.format, &job.format, "parquet"),
            location: pick(&self.location, &job.location, ""),
            schemas_location: pick(&self.schemas_location, &job.schemas_location, ""),
        }
    }

    fn selects(&self, entry: &TableEntry) -> bool {
        self.tables.is_empty()
            || entry
                .table_name()
                .is_some_and(|name| self.tables.iter().any(|t| t == name))
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let job = JobFile::from_file(&cli.job)
        .with_context(|| format!("failed to load job file {}", cli.job))?;
    info!(path = %cli.job, source = %job.source.name, tables = job.tables.len(), "loaded job");

    let credentials = match &cli.credentials {
        Some(path) => Credentials::from_file(path)
            .with_context(|| format!("failed to load credentials {path}"))?,
        None => Credentials::new(),
    };

    let base = cli.request(&job);
    let run_at = Utc::now();
    let selected: Vec<&TableEntry> = job.tables.iter().filter(|t| cli.selects(t)).collect();
    info!(
        mode = %base.mode,
        format = %base.format,
        location = %base.location,
        tables = selected.len(),
        "run settings"
    );

    if cli.dry_run {
        for entry in &selected {
            let request = TableRequest {
                mode: table_mode(base.mode, &entry.options),
                ..base.clone()
            };
            let plan = plan_table(&request, &job.source, &entry.options, run_at)?;
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                plan.table,
                plan.write_mode,
                plan.format,
                plan.destination,
                plan.target.redacted(),
                plan.query
            );
        }
        return Ok(());
    }

    let config = Config::from_env();
    config.log_summary();
    let backend = Arc::new(StorageBackend::from_config(&config)?);
    info!(
        root = %backend.describe(),
        remote = backend.is_remote(),
        sink = %job.sink.name,
        "lake storage ready"
    );
    let engine = LakeEngine::new(backend.clone());

    let mut total_rows = 0u64;
    for entry in &selected {
        let request = TableRequest {
            mode: table_mode(base.mode, &entry.options),
            ..base.clone()
        };
        let report = process_table(
            &engine,
            backend.as_ref(),
            &request,
            &job.source,
            &job.sink,
            &credentials,
            &entry.options,
            run_at,
        )
        .await
        .map_err(|e| {
            error!(
                table = entry.table_name().unwrap_or("<unnamed>"),
                source = %job.source.name,
                error = %e,
                "table ingestion failed"
            );
            e
        })?;
        total_rows += report.rows;
    }

    info!(tables = selected.len(), rows = total_rows, "ingestion run complete");
    Ok(())
}
