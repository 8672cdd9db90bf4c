//! Periodic progress rendering.
//!
//! The renderer is a tokio task that polls the `ProgressAggregator` at a
//! fixed cadence and hands snapshots to a `ProgressSink`. It only reads
//! progress. The orchestrator owns the `RendererHandle`; stopping is
//! guaranteed because dropping the handle signals the task too.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::progress::{ProgressAggregator, ProgressSnapshot};
use crate::segmenter::ChunkRange;

pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Where progress goes (terminal spinners in the CLI). Calls come from the
/// renderer task and from the orchestrator, never concurrently for one job.
pub trait ProgressSink: Send + Sync {
    /// Fetching begins with this plan.
    fn started(&self, _plan: &[ChunkRange]) {}

    /// Periodic redraw.
    fn render(&self, snapshot: &ProgressSnapshot);

    /// Fetching is over (success or failure); tear down any display.
    fn stopped(&self) {}

    /// Chunk `index` of `count` is being appended to the output.
    fn merging(&self, _index: usize, _count: usize) {}
}

/// Sink that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn render(&self, _snapshot: &ProgressSnapshot) {}
}

/// Running renderer. Call `stop` to join it; dropping it only signals.
pub struct RendererHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RendererHandle {
    /// Stop the loop and wait for the final redraw and `stopped` call.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("renderer task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for RendererHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Start redrawing `sink` from `progress` every `interval`.
pub fn spawn_renderer(
    progress: ProgressAggregator,
    plan: Vec<ChunkRange>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
) -> RendererHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        sink.started(&plan);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => sink.render(&progress.snapshot()),
            }
        }
        sink.render(&progress.snapshot());
        sink.stopped();
    });
    RendererHandle {
        stop_tx: Some(stop_tx),
        task: Some(task),
    }
}
