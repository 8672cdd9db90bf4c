//! Easy2 Handler for a single chunk transfer.
//! Validates the final response before the first body byte is kept, then
//! appends to the chunk's temp file and publishes progress.

use curl::easy::{Handler, WriteError};

use crate::control::CancelToken;
use crate::error::PullError;
use crate::fetch_head::ResponseHead;
use crate::progress::ProgressSlot;
use crate::segmenter::ChunkRange;
use crate::storage::ChunkFile;

/// Handler state for one chunk transfer. Any failure is parked in `failure`
/// and the transfer is aborted by returning 0 from `write` (or false from
/// `progress`); the caller reads the parked error after `perform`.
pub(crate) struct ChunkHandler {
    pub(super) chunk: ChunkRange,
    pub(super) sink: Option<ChunkFile>,
    progress: ProgressSlot,
    cancel: CancelToken,
    pub(super) head: ResponseHead,
    /// Set once the final response head passed validation.
    pub(super) validated: bool,
    pub(super) downloaded: u64,
    pub(super) failure: Option<PullError>,
}

impl ChunkHandler {
    pub(crate) fn new(
        chunk: ChunkRange,
        sink: ChunkFile,
        progress: ProgressSlot,
        cancel: CancelToken,
    ) -> Self {
        Self {
            chunk,
            sink: Some(sink),
            progress,
            cancel,
            head: ResponseHead::default(),
            validated: false,
            downloaded: 0,
            failure: None,
        }
    }

    /// Checks the final response head: 2xx, Content-Range present, and a
    /// declared length that fits the chunk.
    fn validate_head(&self) -> Result<(), PullError> {
        let chunk = self.chunk.index;
        if !self.head.is_success() {
            return Err(PullError::HttpStatus {
                chunk: Some(chunk),
                code: self.head.status.unwrap_or(0),
            });
        }
        if self.head.content_range.is_none() {
            return Err(PullError::RangeUnsupportedMidTransfer { chunk });
        }
        let expected = self.chunk.len();
        if let Some(declared) = self.head.content_length() {
            if declared > expected {
                return Err(PullError::ChunkSizeMismatch {
                    chunk,
                    declared,
                    expected,
                });
            }
        }
        Ok(())
    }

    fn accept(&mut self, data: &[u8]) -> Result<(), PullError> {
        if self.cancel.is_cancelled() {
            return Err(PullError::Cancelled);
        }
        if !self.validated {
            self.validate_head()?;
            self.validated = true;
        }

        let expected = self.chunk.len();
        let received = self.downloaded + data.len() as u64;
        if received > expected {
            return Err(PullError::ChunkOverflow {
                chunk: self.chunk.index,
                received,
                expected,
            });
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.append(data).map_err(|source| PullError::TempFile {
                chunk: self.chunk.index,
                path: sink.path().to_path_buf(),
                source,
            })?;
        }
        self.downloaded = received;
        self.progress.record(received, expected);
        Ok(())
    }

    /// Resolve the transfer outcome from the parked failure and curl's result.
    pub(super) fn outcome(&mut self, performed: Result<(), curl::Error>) -> Result<(), PullError> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        if let Err(source) = performed {
            if self.cancel.is_cancelled() {
                return Err(PullError::Cancelled);
            }
            return Err(PullError::Transport {
                chunk: Some(self.chunk.index),
                source,
            });
        }
        // No body arrived, so `write` never validated the head.
        if !self.validated {
            self.validate_head()?;
            self.validated = true;
        }
        Ok(())
    }
}

impl Handler for ChunkHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        self.head.push_bytes(data);
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if self.failure.is_some() {
            return Ok(0);
        }
        match self.accept(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                tracing::debug!(chunk = self.chunk.index, "aborting transfer: {}", e);
                self.failure = Some(e);
                Ok(0)
            }
        }
    }

    fn progress(&mut self, _dltotal: f64, _dlnow: f64, _ultotal: f64, _ulnow: f64) -> bool {
        if self.cancel.is_cancelled() {
            self.failure.get_or_insert(PullError::Cancelled);
            return false;
        }
        true
    }
}
