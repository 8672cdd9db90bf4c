//! Append-only temp file for one chunk.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 64 * 1024;

/// Private sink of one chunk. Bytes are appended in arrival order.
pub struct ChunkFile {
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
}

impl ChunkFile {
    /// Create (or truncate) the temp file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            writer: BufWriter::with_capacity(BUF_SIZE, file),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close, leaving the file in place for the merger.
    pub fn finish(self) -> io::Result<u64> {
        let written = self.written;
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(written)
    }

    /// Close and remove the file. Best-effort: a failed delete is only logged.
    pub fn discard(self) {
        let path = self.path.clone();
        drop(self.writer);
        remove_best_effort(&path);
    }
}

/// Remove a temp file, ignoring "not found" and logging anything else.
pub(crate) fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed temp file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not remove temp file: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_finish_keeps_bytes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.bin.p0");
        let mut f = ChunkFile::create(&p).unwrap();
        f.append(b"hello ").unwrap();
        f.append(b"world").unwrap();
        assert_eq!(f.written(), 11);
        assert_eq!(f.finish().unwrap(), 11);
        assert_eq!(std::fs::read(&p).unwrap(), b"hello world");
    }

    #[test]
    fn create_truncates_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.bin.p1");
        std::fs::write(&p, b"stale data from an earlier run").unwrap();
        let mut f = ChunkFile::create(&p).unwrap();
        f.append(b"new").unwrap();
        f.finish().unwrap();
        assert_eq!(std::fs::read(&p).unwrap(), b"new");
    }

    #[test]
    fn discard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.bin.p2");
        let mut f = ChunkFile::create(&p).unwrap();
        f.append(b"partial").unwrap();
        f.discard();
        assert!(!p.exists());
    }
}
