//! Fan-out of chunk transfers and fail-fast fan-in.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::control::CancelToken;
use crate::downloader::{fetch_chunk, TransferOptions};
use crate::error::PullError;
use crate::job::DownloadJob;
use crate::progress::ProgressAggregator;
use crate::segmenter::ChunkRange;
use crate::storage::remove_best_effort;

/// How long a failed job waits for cancelled siblings to unwind.
const CANCEL_GRACE: Duration = Duration::from_millis(1500);

/// Runs every chunk on tokio's blocking pool and waits for all of them, or
/// for the first failure. On failure the shared token is cancelled, siblings
/// get `CANCEL_GRACE` to abort at their next libcurl callback, and every temp
/// file of the plan is removed before the error is returned.
/// Returns the total number of bytes written to temp files.
pub(super) async fn fetch_all(
    job: &DownloadJob,
    plan: &[ChunkRange],
    temp_paths: &[PathBuf],
    progress: &ProgressAggregator,
    cancel: &CancelToken,
    opts: &TransferOptions,
) -> Result<u64, PullError> {
    let mut set = JoinSet::new();
    for (chunk, temp) in plan.iter().zip(temp_paths) {
        let url = job.url.clone();
        let headers = job.headers.clone();
        let chunk = *chunk;
        let temp = temp.clone();
        let slot = progress.slot(chunk.index);
        let cancel = cancel.clone();
        let opts = *opts;
        set.spawn_blocking(move || fetch_chunk(&url, &headers, chunk, &temp, slot, cancel, &opts));
    }

    let mut total = 0u64;
    while let Some(joined) = set.join_next().await {
        let result = joined
            .map_err(|e| PullError::Worker(e.to_string()))
            .and_then(|r| r);
        match result {
            Ok(bytes) => total += bytes,
            Err(e) => {
                cancel.cancel();
                let _ = tokio::time::timeout(CANCEL_GRACE, async {
                    while set.join_next().await.is_some() {}
                })
                .await;
                let abandoned = set.len();
                set.detach_all();
                for temp in temp_paths {
                    remove_best_effort(temp);
                }
                tracing::debug!(
                    chunk = ?e.chunk(),
                    abandoned,
                    "first chunk failure, cancelled remaining transfers"
                );
                return Err(e);
            }
        }
    }
    Ok(total)
}
