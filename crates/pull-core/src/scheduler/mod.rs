//! Job orchestration: probe, plan, fetch every chunk concurrently, merge.
//!
//! Fail-fast: the first failing chunk ends the job. The merge only runs
//! after every chunk succeeded, so a failed job never touches the output.

mod fetch;
mod phase;

pub use phase::JobPhase;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::control::CancelToken;
use crate::downloader::TransferOptions;
use crate::error::PullError;
use crate::fetch_head::{self, ResourceDescriptor};
use crate::job::DownloadJob;
use crate::progress::ProgressAggregator;
use crate::render::{spawn_renderer, NullSink, ProgressSink, DEFAULT_RENDER_INTERVAL};
use crate::segmenter::{plan_chunks, ChunkRange};
use crate::storage::merge_chunks;

use self::fetch::fetch_all;
use self::phase::PhaseTracker;

/// Outcome of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub output_path: PathBuf,
    pub total_size: u64,
    pub chunk_count: usize,
    pub elapsed: Duration,
}

/// Runs download jobs with a fixed transfer setup, progress sink and cancel token.
pub struct JobRunner {
    transfer: TransferOptions,
    render_interval: Duration,
    sink: Arc<dyn ProgressSink>,
    cancel: CancelToken,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self {
            transfer: TransferOptions::default(),
            render_interval: DEFAULT_RENDER_INTERVAL,
            sink: Arc::new(NullSink),
            cancel: CancelToken::new(),
        }
    }
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer(mut self, transfer: TransferOptions) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts the running job when cancelled (e.g. on Ctrl-C).
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Download `job.url` into `job.output_path`.
    pub async fn run(&self, job: &DownloadJob) -> Result<JobReport, PullError> {
        let started = Instant::now();
        let mut phase = PhaseTracker::start(&job.url);
        match self.run_phases(job, &mut phase, started).await {
            Ok(report) => {
                phase.advance();
                tracing::info!(
                    url = %job.url,
                    output = %report.output_path.display(),
                    bytes = report.total_size,
                    chunks = report.chunk_count,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "download complete"
                );
                Ok(report)
            }
            Err(e) => {
                phase.fail(&e);
                Err(e)
            }
        }
    }

    async fn run_phases(
        &self,
        job: &DownloadJob,
        phase: &mut PhaseTracker<'_>,
        started: Instant,
    ) -> Result<JobReport, PullError> {
        let descriptor = self.probe(job).await?;
        if self.cancel.is_cancelled() {
            return Err(PullError::Cancelled);
        }

        phase.advance();
        let plan = plan_for(descriptor.total_size, job.concurrency.get());
        let temp_paths: Vec<PathBuf> = plan.iter().map(|c| job.chunk_temp_path(c.index)).collect();
        let progress = ProgressAggregator::new(plan.len());
        tracing::debug!(
            total_size = descriptor.total_size,
            chunks = plan.len(),
            "planned chunks"
        );

        phase.advance();
        let renderer = (!job.silent).then(|| {
            spawn_renderer(
                progress.clone(),
                plan.clone(),
                Arc::clone(&self.sink),
                self.render_interval,
            )
        });
        let fetched = fetch_all(
            job,
            &plan,
            &temp_paths,
            &progress,
            &self.cancel,
            &self.transfer,
        )
        .await;
        if let Some(renderer) = renderer {
            renderer.stop().await;
        }
        let fetched = fetched?;
        tracing::debug!(bytes = fetched, "all chunks fetched");

        phase.advance();
        self.merge(job, temp_paths).await?;

        Ok(JobReport {
            output_path: job.output_path.clone(),
            total_size: descriptor.total_size,
            chunk_count: plan.len(),
            elapsed: started.elapsed(),
        })
    }

    async fn probe(&self, job: &DownloadJob) -> Result<ResourceDescriptor, PullError> {
        let url = job.url.clone();
        let headers = job.headers.clone();
        let opts = self.transfer;
        let cancel = self.cancel.clone();
        tokio::task::spawn_blocking(move || fetch_head::probe(&url, &headers, &opts, &cancel))
            .await
            .map_err(|e| PullError::Worker(e.to_string()))?
    }

    async fn merge(&self, job: &DownloadJob, temp_paths: Vec<PathBuf>) -> Result<u64, PullError> {
        let sink = (!job.silent).then(|| Arc::clone(&self.sink));
        let output = job.output_path.clone();
        let count = temp_paths.len();
        tokio::task::spawn_blocking(move || {
            merge_chunks(&temp_paths, &output, |index| {
                if let Some(sink) = &sink {
                    sink.merging(index, count);
                }
            })
        })
        .await
        .map_err(|e| PullError::Worker(e.to_string()))?
    }
}

/// Plan with concurrency clamped to the resource size so no chunk is empty.
fn plan_for(total_size: u64, concurrency: usize) -> Vec<ChunkRange> {
    let chunks = (concurrency as u64).min(total_size).max(1) as usize;
    if chunks < concurrency {
        tracing::debug!(concurrency, chunks, "resource smaller than concurrency, clamping");
    }
    plan_chunks(total_size, chunks)
}
