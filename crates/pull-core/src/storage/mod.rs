//! Disk I/O and file lifecycle.
//!
//! Each chunk appends to its own temp file (`<output>.p<index>`); once every
//! chunk is in, the merger concatenates them in index order into the output
//! and deletes each temp file as soon as it has been copied.

mod chunk_file;
mod merge;

pub use chunk_file::ChunkFile;
pub(crate) use chunk_file::remove_best_effort;
pub use merge::merge_chunks;
