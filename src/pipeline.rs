//! Run orchestration.
//!
//! `find_valid_codes` drives the whole pipeline: enumerate the input
//! directory, create a scratch area, stream-partition every input into
//! per-bucket spill files, reduce the buckets on a worker pool, then sort
//! the surviving records for a deterministic artifact.
//!
//! The scratch directory is owned by a [`tempfile::TempDir`] whose Drop
//! removes it on every exit path, including error returns and unwinds.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use rayon::prelude::*;

use crate::constants::{NUM_BUCKETS, REDUCE_PROGRESS_INTERVAL};
use crate::error::{FirstErrorCapture, Result, SiftError};
use crate::partition::{partition_inputs, spill_path};
use crate::reduce::reduce_spill;
use crate::ProgressFn;

/// Find every valid code in a directory of input files.
///
/// A code is valid when its length is 8–10 bytes and it appears in at least
/// two distinct input files. Inputs do not fit in memory collectively, so
/// records are hash-partitioned into on-disk buckets first and each bucket
/// is reduced independently.
///
/// # Arguments
/// * `input_dir` - Directory of line-delimited input files. Sub-directories
///   are skipped, not recursed. Must contain at least one file.
/// * `progress` - Optional progress sink. Invoked only from the calling
///   thread; when absent no progress is produced and no locking happens.
/// * `workers` - Reduction pool size; 0 means all available cores. Values
///   larger than the bucket count are harmless.
///
/// # Returns
/// The valid codes, lexicographically sorted by byte value, duplicate-free.
pub fn find_valid_codes(
    input_dir: &Path,
    progress: Option<&ProgressFn>,
    workers: usize,
) -> Result<Vec<Vec<u8>>> {
    let inputs = enumerate_inputs(input_dir)?;

    let scratch = tempfile::Builder::new()
        .prefix("codesift-")
        .tempdir()
        .map_err(|e| SiftError::io(std::env::temp_dir(), "create scratch directory", e))?;
    log::info!(
        "scratch directory: {} ({} input files)",
        scratch.path().display(),
        inputs.len()
    );

    if let Some(cb) = progress {
        cb("Phase 1: partitioning input files into buckets...");
    }
    partition_inputs(&inputs, NUM_BUCKETS, scratch.path(), progress)?;

    if let Some(cb) = progress {
        cb("Phase 2: reducing buckets to valid codes...");
    }
    let valid = reduce_buckets(scratch.path(), NUM_BUCKETS, progress, workers)?;

    if let Some(cb) = progress {
        cb(&format!("Found {} valid codes", valid.len()));
    }

    Ok(valid)
}

/// List the input files of a directory in name order.
///
/// Raw directory order is platform-dependent; sorting by path keeps source
/// indices, and with them the spill layout, stable run to run.
fn enumerate_inputs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir).map_err(|e| {
        SiftError::config(input_dir, format!("cannot read input directory: {}", e))
    })?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            SiftError::config(input_dir, format!("cannot read input directory: {}", e))
        })?;
        let file_type = entry
            .file_type()
            .map_err(|e| SiftError::io(entry.path(), "stat directory entry", e))?;
        if file_type.is_dir() {
            continue;
        }
        inputs.push(entry.path());
    }
    inputs.sort();

    if inputs.is_empty() {
        return Err(SiftError::config(input_dir, "no input files found"));
    }
    Ok(inputs)
}

/// Reduce every non-empty spill file on a pool of `workers` threads and
/// return the sorted union of their results.
///
/// Workers pull spill paths from a shared cursor and push per-bucket result
/// sets into a bounded channel drained by the calling thread. A failing
/// worker stores its error and stops; its siblings drain the queue normally
/// and the first error observed becomes the run's error.
fn reduce_buckets(
    scratch_dir: &Path,
    num_buckets: usize,
    progress: Option<&ProgressFn>,
    workers: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut spill_paths: Vec<PathBuf> = Vec::new();
    for bucket in 0..num_buckets {
        let path = spill_path(scratch_dir, bucket);
        match fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => spill_paths.push(path),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SiftError::io(path, "stat spill file", e)),
        }
    }

    let pool_size = if workers == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        workers
    };
    let total = spill_paths.len();
    log::info!("reducing {} non-empty buckets on {} workers", total, pool_size);

    let first_error = FirstErrorCapture::new();
    let cursor = AtomicUsize::new(0);
    let mut valid: Vec<Vec<u8>> = Vec::new();

    std::thread::scope(|scope| {
        // Bounded results channel: workers block once the collector falls
        // behind by pool_size bucket results.
        let (tx, rx) = mpsc::sync_channel::<Vec<Vec<u8>>>(pool_size);

        for _ in 0..pool_size {
            let tx = tx.clone();
            let cursor = &cursor;
            let first_error = &first_error;
            let spill_paths = &spill_paths;
            scope.spawn(move || loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(path) = spill_paths.get(i) else { break };
                match reduce_spill(path) {
                    Ok(codes) => {
                        if tx.send(codes).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        first_error.store(err);
                        break;
                    }
                }
            });
        }
        drop(tx);

        // Collector on the owning thread; the receive loop ends once every
        // worker has dropped its sender. Progress stays on this thread so
        // the sink never needs locking.
        let mut done = 0usize;
        for codes in rx {
            valid.extend(codes);
            done += 1;
            if let Some(cb) = progress {
                if done % REDUCE_PROGRESS_INTERVAL == 0 || done == total {
                    cb(&format!(
                        "    reduced {}/{} buckets ({} valid codes so far)",
                        done,
                        total,
                        valid.len()
                    ));
                }
            }
        }
    });

    if let Some(err) = first_error.take() {
        return Err(err);
    }

    valid.par_sort_unstable();

    if let Some(cb) = progress {
        cb(&format!(
            "  reduction complete: {} buckets processed, {} valid codes found",
            total,
            valid.len()
        ));
    }

    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_enumerate_inputs_sorted_and_skips_subdirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "x\n").unwrap();
        fs::write(dir.path().join("a.txt"), "x\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "x\n").unwrap();

        let inputs = enumerate_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_enumerate_inputs_empty_directory() {
        let dir = tempdir().unwrap();
        let err = enumerate_inputs(dir.path()).unwrap_err();
        assert!(matches!(err, SiftError::Config { .. }));
    }

    #[test]
    fn test_enumerate_inputs_missing_directory() {
        let err = enumerate_inputs(Path::new("/path/that/does/not/exist")).unwrap_err();
        assert!(matches!(err, SiftError::Config { .. }));
    }

    #[test]
    fn test_reduce_buckets_skips_empty_spills() {
        let dir = tempdir().unwrap();
        // bucket 0 empty, bucket 1 populated, bucket 2 missing entirely
        fs::write(spill_path(dir.path(), 0), "").unwrap();
        fs::write(spill_path(dir.path(), 1), "GOODCODE|0\nGOODCODE|1\n").unwrap();

        let valid = reduce_buckets(dir.path(), 3, None, 2).unwrap();
        assert_eq!(valid, vec![b"GOODCODE".to_vec()]);
    }
}
