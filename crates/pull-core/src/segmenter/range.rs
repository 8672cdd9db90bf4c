//! Chunk type and range planning.

/// One planned chunk: byte range [start, end) (half-open) at position `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Position in the plan; also the merge order.
    pub index: usize,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ChunkRange {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }

    /// Range in the `start-end` form libcurl expects (inclusive end).
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end.saturating_sub(1))
    }
}

/// Builds a chunk plan for a given total size and concurrency.
///
/// Every chunk is `floor(total_size / concurrency)` bytes except the last,
/// which runs to `total_size` and absorbs the remainder. When `concurrency`
/// exceeds `total_size` the leading chunks come out empty; callers clamp
/// first. Returns an empty vec if either argument is 0.
pub fn plan_chunks(total_size: u64, concurrency: usize) -> Vec<ChunkRange> {
    if total_size == 0 || concurrency == 0 {
        return Vec::new();
    }

    let chunk_size = total_size / concurrency as u64;
    (0..concurrency)
        .map(|index| {
            let start = chunk_size * index as u64;
            let end = if index == concurrency - 1 {
                total_size
            } else {
                chunk_size * (index as u64 + 1)
            };
            ChunkRange { index, start, end }
        })
        .collect()
}
