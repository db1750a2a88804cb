use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::batch::{BatchCollector, Candidate};
use crate::client::AnalysisClient;
use crate::export;
use crate::model::{ResultSet, RunConfig};
use crate::request;
use crate::text_summary;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sigdetect",
    version,
    about = "Batch PDF signature detection client with optional TUI"
)]
pub struct Cli {
    /// PDF documents to stage for analysis
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Analysis service endpoint
    #[arg(long, default_value = "http://127.0.0.1:5000/analyze")]
    pub endpoint: String,

    /// Timeout for one analysis round trip
    #[arg(long, default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Print the full result set as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Write results.csv to the current directory after a completed analysis
    #[arg(long)]
    pub export: bool,

    /// Export the returned CSV to this path instead of results.csv
    #[arg(long, value_name = "PATH")]
    pub export_csv: Option<PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            let mut args = args;
            args.text = true;
            init_tracing();
            return run_once(args).await;
        }
    }

    init_tracing();
    run_once(args).await
}

/// Diagnostics go to stderr so piped stdout stays clean. TUI mode skips
/// this entirely and routes diagnostics through its info line instead.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        endpoint: args.endpoint.clone(),
        request_timeout: Duration::from(args.timeout),
        user_agent: format!("sigdetect/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// The declared type stands in for what a browser file picker would report.
pub fn declared_type_for(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

/// Read the staged paths into candidates for the acceptance policy.
pub fn load_candidates(paths: &[PathBuf]) -> Result<Vec<Candidate>> {
    paths
        .iter()
        .map(|path| {
            let bytes =
                std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
                .ok_or_else(|| anyhow::anyhow!("{}: not a usable file name", path.display()))?;
            Ok(Candidate {
                declared_type: declared_type_for(path),
                name,
                bytes,
            })
        })
        .collect()
}

/// Headless flow: collect, submit once, print, export.
async fn run_once(args: Cli) -> Result<()> {
    let candidates = load_candidates(&args.files)?;
    let mut collector = BatchCollector::new();
    for rejection in collector.replace_all(candidates) {
        warn!(%rejection, "document rejected");
    }
    if collector.is_empty() {
        anyhow::bail!("no acceptable documents to analyze");
    }
    info!(count = collector.count(), endpoint = %args.endpoint, "submitting batch");

    let cfg = build_config(&args);
    let client = AnalysisClient::new(&cfg)?;
    let payload = request::build(&collector.take_batch());
    let result = client.submit(payload).await.context("analysis failed")?;

    handle_exports(&args, &result)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in text_summary::build_text_summary(&result).lines {
            println!("{line}");
        }
    }
    Ok(())
}

/// Write the CSV when either export flag is set. Shared by text and JSON modes.
pub(crate) fn handle_exports(args: &Cli, result: &ResultSet) -> Result<()> {
    if args.export || args.export_csv.is_some() {
        let path = export::export_csv(result, args.export_csv.as_deref())?;
        info!(path = %path.display(), "exported CSV");
    }
    Ok(())
}
