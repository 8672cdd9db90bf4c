//! Ranged transfer of one chunk.
//!
//! Runs one libcurl GET with an inclusive `Range` header, streams the body
//! into the chunk's temp file and publishes progress. Blocks the calling
//! thread; the orchestrator runs one of these per chunk on tokio's blocking
//! pool.

mod handler;

use std::path::Path;
use std::time::Duration;

use curl::easy::{Easy2, Handler};

use crate::config::PullConfig;
use crate::control::CancelToken;
use crate::error::PullError;
use crate::job::RequestHeaders;
use crate::progress::ProgressSlot;
use crate::segmenter::ChunkRange;
use crate::storage::ChunkFile;

use self::handler::ChunkHandler;

/// libcurl knobs shared by the probe and every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub connect_timeout: Duration,
    /// Abort when no byte arrives for this long. `None` waits forever.
    pub stall_timeout: Option<Duration>,
    pub max_redirects: u32,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            stall_timeout: None,
            max_redirects: 10,
        }
    }
}

impl From<&PullConfig> for TransferOptions {
    fn from(cfg: &PullConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            stall_timeout: cfg.stall_timeout_secs.map(Duration::from_secs),
            max_redirects: cfg.max_redirects,
        }
    }
}

impl TransferOptions {
    pub(crate) fn configure<H: Handler>(&self, easy: &mut Easy2<H>) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(self.connect_timeout)?;
        if let Some(stall) = self.stall_timeout {
            easy.low_speed_limit(1)?;
            easy.low_speed_time(stall)?;
        }
        Ok(())
    }
}

/// Downloads `chunk` of `url` into a fresh temp file at `temp_path`.
///
/// On success the temp file is left in place for the merger and the number
/// of bytes written is returned. On failure the temp file is removed
/// (best-effort) and the error names the chunk.
pub fn fetch_chunk(
    url: &str,
    headers: &RequestHeaders,
    chunk: ChunkRange,
    temp_path: &Path,
    progress: ProgressSlot,
    cancel: CancelToken,
    opts: &TransferOptions,
) -> Result<u64, PullError> {
    if cancel.is_cancelled() {
        return Err(PullError::Cancelled);
    }
    let sink = ChunkFile::create(temp_path).map_err(|source| PullError::TempFile {
        chunk: chunk.index,
        path: temp_path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        chunk = chunk.index,
        range = %chunk.range_header_value(),
        path = %temp_path.display(),
        "chunk transfer starting"
    );

    let mut easy = Easy2::new(ChunkHandler::new(chunk, sink, progress, cancel));
    let performed = perform_ranged_get(&mut easy, url, headers, &chunk, opts);

    let handler = easy.get_mut();
    let outcome = handler.outcome(performed);
    let sink = handler.sink.take();

    match (outcome, sink) {
        (Ok(()), Some(sink)) => {
            let written = sink.finish().map_err(|source| PullError::TempFile {
                chunk: chunk.index,
                path: temp_path.to_path_buf(),
                source,
            })?;
            tracing::debug!(chunk = chunk.index, bytes = written, "chunk transfer done");
            Ok(written)
        }
        (Ok(()), None) => Err(PullError::Worker(format!(
            "chunk {} lost its temp file",
            chunk.index
        ))),
        (Err(e), sink) => {
            if let Some(sink) = sink {
                sink.discard();
            }
            Err(e)
        }
    }
}

fn perform_ranged_get(
    easy: &mut Easy2<ChunkHandler>,
    url: &str,
    headers: &RequestHeaders,
    chunk: &ChunkRange,
    opts: &TransferOptions,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    opts.configure(easy)?;
    easy.range(&chunk.curl_range())?;
    easy.http_headers(headers.to_curl_list()?)?;
    // Needed for the progress callback, which is where cancellation is noticed while idle.
    easy.progress(true)?;
    easy.perform()
}
