//! CLI for pull: one URL, fetched in concurrent byte ranges.

mod progress;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use indicatif::HumanDuration;
use pull_core::config::{self, PullConfig};
use pull_core::downloader::TransferOptions;
use pull_core::job::{default_concurrency, DEFAULT_USER_AGENT};
use pull_core::url_model::filename_from_url_path;
use pull_core::{DownloadJob, JobRunner, RequestHeaders};

use progress::SpinnerSink;

/// Top-level CLI for pull.
#[derive(Debug, Parser)]
#[command(name = "pull", version)]
#[command(about = "pull: download one file over HTTP in concurrent byte ranges", long_about = None)]
pub struct Cli {
    /// Direct HTTP/HTTPS URL to download. The server must accept byte ranges.
    pub url: String,

    /// Output file. Defaults to the last path segment of the URL.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of chunks fetched in parallel (default: config, else 2 x CPUs).
    #[arg(short, long, value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Do not draw progress.
    #[arg(short, long)]
    pub silent: bool,

    /// Extra request header, e.g. -H "Referer: https://example.com/". Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(spec: &str) -> Result<(String, String), String> {
    RequestHeaders::parse_header_arg(spec)
}

/// Parse arguments, run the download, print the summary line.
///
/// Usage errors and `--help` print to stderr and exit 1; `--version` prints
/// to stdout and exits 0.
pub async fn run_from_args() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !is_usage_failure(&err) => err.exit(),
        Err(err) => {
            eprint!("{}", err);
            std::process::exit(1);
        }
    };
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let cwd = std::env::current_dir().context("reading current directory")?;
    let job = build_job(&cli, &cfg, &cwd)?;

    let mut runner = JobRunner::new()
        .transfer(TransferOptions::from(&cfg))
        .render_interval(Duration::from_millis(cfg.render_interval_ms.max(1)));
    if !job.silent {
        runner = runner.sink(Arc::new(SpinnerSink::new()));
    }

    let cancel = runner.cancel_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling download");
            cancel.cancel();
        }
    });

    let result = runner.run(&job).await;
    ctrl_c.abort();
    let report = result?;

    println!(
        "Downloaded {} in {}",
        report.output_path.display(),
        HumanDuration(report.elapsed)
    );
    Ok(())
}

/// Everything clap rejects exits 1 except a version request.
fn is_usage_failure(err: &clap::Error) -> bool {
    err.kind() != ErrorKind::DisplayVersion
}

/// Resolve flags and config into a job. Relative outputs are joined onto `cwd`.
fn build_job(cli: &Cli, cfg: &PullConfig, cwd: &Path) -> Result<DownloadJob> {
    let output = match &cli.output {
        Some(path) => path.clone(),
        None => filename_from_url_path(&cli.url)
            .map(PathBuf::from)
            .with_context(|| {
                format!(
                    "cannot derive a file name from {}; pass --output",
                    cli.url
                )
            })?,
    };
    let output = if output.is_absolute() {
        output
    } else {
        cwd.join(output)
    };

    let concurrency = match cli.concurrency {
        Some(n) => n,
        None => cfg
            .concurrency
            .and_then(NonZeroUsize::new)
            .unwrap_or_else(default_concurrency),
    };

    Ok(DownloadJob::new(cli.url.clone(), output)
        .concurrency(concurrency)
        .headers(build_headers(cli, cfg))
        .silent(cli.silent))
}

/// Base `User-Agent`, then config headers, then `-H` flags; later names win.
fn build_headers(cli: &Cli, cfg: &PullConfig) -> RequestHeaders {
    let user_agent = match cfg.user_agent.trim() {
        "" => DEFAULT_USER_AGENT,
        ua => ua,
    };
    let mut headers = RequestHeaders::with_user_agent(user_agent);
    for (name, value) in &cfg.headers {
        headers.set(name, value);
    }
    for (name, value) in &cli.headers {
        headers.set(name, value);
    }
    headers
}
