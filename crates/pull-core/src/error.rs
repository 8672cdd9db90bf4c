//! Error taxonomy for a pull job.
//!
//! Probe-time errors stop the job before any transfer starts. Fetch-time
//! errors carry the chunk index so the caller can tell which range failed.
//! Nothing here is retried.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    /// Server did not advertise `Accept-Ranges: bytes`.
    #[error("remote service does not support range downloads: {url}")]
    UnsupportedResource { url: String },

    /// `Content-Length` missing, non-numeric or zero.
    #[error("cannot download file with invalid length ({})", .value.as_deref().unwrap_or("missing"))]
    InvalidLength { url: String, value: Option<String> },

    /// Final response status outside 2xx (probe: `chunk` is None).
    #[error("{}HTTP {code}", chunk_prefix(.chunk))]
    HttpStatus { chunk: Option<usize>, code: u32 },

    /// Ranged GET answered without a `Content-Range` header.
    #[error("chunk {chunk}: server ignored the range request (no Content-Range in response)")]
    RangeUnsupportedMidTransfer { chunk: usize },

    /// Server announced more bytes than the chunk asked for.
    #[error("chunk {chunk}: server responded with intent to stream {declared} bytes but only {expected} were expected")]
    ChunkSizeMismatch {
        chunk: usize,
        declared: u64,
        expected: u64,
    },

    /// Body kept coming past the chunk's byte budget.
    #[error("chunk {chunk}: download size exceeded expected size ({received} > {expected})")]
    ChunkOverflow {
        chunk: usize,
        received: u64,
        expected: u64,
    },

    /// libcurl reported a transport failure (DNS, connect, reset, timeout...).
    #[error("{}transfer failed: {source}", chunk_prefix(.chunk))]
    Transport {
        chunk: Option<usize>,
        #[source]
        source: curl::Error,
    },

    /// Creating or writing a chunk's temp file failed.
    #[error("chunk {chunk}: temp file {}: {source}", .path.display())]
    TempFile {
        chunk: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read, write or delete failed while assembling the output.
    #[error("merge failed at {}: {source}", .path.display())]
    MergeIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shared cancel token was set (sibling failure or user interrupt).
    #[error("download cancelled")]
    Cancelled,

    /// A worker task panicked or could not be joined.
    #[error("worker task failed: {0}")]
    Worker(String),
}

fn chunk_prefix(chunk: &Option<usize>) -> String {
    match chunk {
        Some(i) => format!("chunk {}: ", i),
        None => String::new(),
    }
}

impl PullError {
    /// Chunk index the error belongs to, if it happened during a ranged transfer.
    pub fn chunk(&self) -> Option<usize> {
        match self {
            PullError::HttpStatus { chunk, .. } | PullError::Transport { chunk, .. } => *chunk,
            PullError::RangeUnsupportedMidTransfer { chunk }
            | PullError::ChunkSizeMismatch { chunk, .. }
            | PullError::ChunkOverflow { chunk, .. }
            | PullError::TempFile { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}
