//! Range math and chunk planning.
//!
//! Splits a resource into N contiguous chunks and computes the HTTP Range
//! header for each.

mod range;

pub use range::{plan_chunks, ChunkRange};
