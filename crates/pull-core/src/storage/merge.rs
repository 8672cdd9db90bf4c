//! Ordered concatenation of chunk temp files into the final output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PullError;

fn merge_err(path: &Path) -> impl FnOnce(io::Error) -> PullError + '_ {
    move |source| PullError::MergeIo {
        path: path.to_path_buf(),
        source,
    }
}

/// Append every temp file, in slice order, to a fresh `output`, deleting
/// each temp file right after it has been copied. Calls `on_chunk(i)` before
/// chunk `i` is copied. Returns the number of bytes written.
///
/// Not transactional: on failure the partial output stays where it is.
pub fn merge_chunks(
    temp_paths: &[PathBuf],
    output: &Path,
    mut on_chunk: impl FnMut(usize),
) -> Result<u64, PullError> {
    let file = File::create(output).map_err(merge_err(output))?;
    let mut out = BufWriter::new(file);
    let mut total = 0u64;

    for (index, temp) in temp_paths.iter().enumerate() {
        on_chunk(index);
        let mut input = File::open(temp).map_err(merge_err(temp))?;
        let n = io::copy(&mut input, &mut out).map_err(merge_err(temp))?;
        drop(input);
        std::fs::remove_file(temp).map_err(merge_err(temp))?;
        tracing::debug!(index, bytes = n, path = %temp.display(), "merged chunk");
        total += n;
    }

    out.flush().map_err(merge_err(output))?;
    let file = out
        .into_inner()
        .map_err(|e| merge_err(output)(e.into_error()))?;
    file.sync_all().map_err(merge_err(output))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::chunk_temp_path;

    fn write_chunks(output: &Path, parts: &[&[u8]]) -> Vec<PathBuf> {
        parts
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let p = chunk_temp_path(output, i);
                std::fs::write(&p, data).unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn concatenates_in_index_order_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("file.bin");
        let temps = write_chunks(&output, &[b"aaa", b"bbbb", b"", b"cc"]);

        let mut seen = Vec::new();
        let n = merge_chunks(&temps, &output, |i| seen.push(i)).unwrap();

        assert_eq!(n, 9);
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(std::fs::read(&output).unwrap(), b"aaabbbbcc");
        for t in &temps {
            assert!(!t.exists(), "{} should be deleted", t.display());
        }
    }

    #[test]
    fn overwrites_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("file.bin");
        std::fs::write(&output, b"old contents that are longer").unwrap();
        let temps = write_chunks(&output, &[b"new"]);
        merge_chunks(&temps, &output, |_| {}).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"new");
    }

    #[test]
    fn missing_chunk_leaves_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("file.bin");
        let mut temps = write_chunks(&output, &[b"first"]);
        temps.push(chunk_temp_path(&output, 1));

        let err = merge_chunks(&temps, &output, |_| {}).unwrap_err();
        match err {
            PullError::MergeIo { path, .. } => assert_eq!(path, temps[1]),
            other => panic!("expected MergeIo, got {other:?}"),
        }
        assert!(!temps[0].exists(), "consumed chunk is already gone");
        assert!(output.exists(), "partial output is not rolled back");
    }
}
