//! Streaming partition phase.
//!
//! Every input file is read once, line by line. Lines that survive the
//! length pre-filter are appended to one of `num_buckets` spill files keyed
//! by [`bucket_for`](crate::hash::bucket_for), tagged with the index of the
//! file they came from. One buffered writer per bucket stays open for the
//! whole phase; peak open files during partitioning is `num_buckets + 1`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::{
    MAX_CODE_LEN, MIN_CODE_LEN, PARTITION_PROGRESS_INTERVAL, SCANNER_INITIAL_BUFFER,
    SCANNER_MAX_LINE,
};
use crate::error::{Result, SiftError};
use crate::hash::bucket_for;
use crate::ProgressFn;

/// Path of the spill file for one bucket inside the scratch directory.
pub(crate) fn spill_path(scratch_dir: &Path, bucket: usize) -> PathBuf {
    scratch_dir.join(format!("bucket_{:03}.txt", bucket))
}

/// Incremental line reader with a bounded line length.
///
/// Starts from a 64 KiB buffer and refuses lines longer than 1 MiB; an
/// over-long line is an `InvalidData` error rather than an allocation blowup.
/// Only the trailing `\n` is consumed and stripped; a trailing `\r` stays
/// part of the record and counts toward its length.
pub(crate) struct LineScanner<R> {
    reader: R,
    buf: Vec<u8>,
    max_line: usize,
}

impl<R: BufRead> LineScanner<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(SCANNER_INITIAL_BUFFER),
            max_line: SCANNER_MAX_LINE,
        }
    }

    /// Next line without its trailing `\n`, or `None` at end of input.
    ///
    /// The returned slice is only valid until the next call.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.buf.clear();
        loop {
            let chunk = self.reader.fill_buf()?;
            if chunk.is_empty() {
                // EOF; a final unterminated line is still a line.
                return if self.buf.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(&self.buf))
                };
            }

            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    if self.buf.len() + pos > self.max_line {
                        return Err(oversized_line(self.max_line));
                    }
                    self.buf.extend_from_slice(&chunk[..pos]);
                    self.reader.consume(pos + 1);
                    return Ok(Some(&self.buf));
                }
                None => {
                    if self.buf.len() + chunk.len() > self.max_line {
                        return Err(oversized_line(self.max_line));
                    }
                    let n = chunk.len();
                    self.buf.extend_from_slice(chunk);
                    self.reader.consume(n);
                }
            }
        }
    }
}

fn oversized_line(max_line: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line exceeds maximum length of {} bytes", max_line),
    )
}

/// Stream all input files into per-bucket spill files.
///
/// Records shorter than 8 or longer than 10 bytes are dropped here; the
/// multi-source membership check happens later, in the reducer. Within a
/// spill file, entries appear in read order (file-major, line-minor), though
/// nothing downstream depends on that.
///
/// All spill writers are flushed before returning; on the error path the
/// buffered writers flush on drop, best-effort, and the scratch directory is
/// removed by the orchestrator regardless.
pub(crate) fn partition_inputs(
    inputs: &[PathBuf],
    num_buckets: usize,
    scratch_dir: &Path,
    progress: Option<&ProgressFn>,
) -> Result<()> {
    let mut writers: Vec<BufWriter<File>> = Vec::with_capacity(num_buckets);
    for bucket in 0..num_buckets {
        let path = spill_path(scratch_dir, bucket);
        let file = File::create(&path).map_err(|e| SiftError::io(&path, "create spill file", e))?;
        writers.push(BufWriter::new(file));
    }

    let mut total_read: u64 = 0;
    let mut total_kept: u64 = 0;

    for (source_index, input) in inputs.iter().enumerate() {
        if let Some(cb) = progress {
            cb(&format!(
                "  partitioning file {}/{}: {}",
                source_index + 1,
                inputs.len(),
                input.file_name().unwrap_or(input.as_os_str()).to_string_lossy()
            ));
        }

        let file = File::open(input).map_err(|e| SiftError::io(input, "open input file", e))?;
        let mut scanner = LineScanner::new(BufReader::new(file));

        let mut file_read: u64 = 0;
        let mut file_kept: u64 = 0;

        loop {
            let record = match scanner.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(SiftError::io(input, "read input file", e)),
            };
            file_read += 1;
            total_read += 1;

            if let Some(cb) = progress {
                if file_read % PARTITION_PROGRESS_INTERVAL == 0 {
                    cb(&format!(
                        "    processed {}M lines ({}M length-eligible)",
                        file_read / 1_000_000,
                        file_kept / 1_000_000
                    ));
                }
            }

            if record.is_empty() {
                continue;
            }
            if record.len() < MIN_CODE_LEN || record.len() > MAX_CODE_LEN {
                continue;
            }

            let bucket = bucket_for(record, num_buckets);
            let writer = &mut writers[bucket];
            writer
                .write_all(record)
                .and_then(|_| writeln!(writer, "|{}", source_index))
                .map_err(|e| {
                    SiftError::io(spill_path(scratch_dir, bucket), "write spill entry", e)
                })?;

            file_kept += 1;
            total_kept += 1;
        }

        if let Some(cb) = progress {
            cb(&format!(
                "    file {} complete: {} lines read, {} records partitioned",
                source_index + 1,
                file_read,
                file_kept
            ));
        }
    }

    for (bucket, writer) in writers.iter_mut().enumerate() {
        writer.flush().map_err(|e| {
            SiftError::io(spill_path(scratch_dir, bucket), "flush spill file", e)
        })?;
    }

    if let Some(cb) = progress {
        cb(&format!(
            "  partitioning complete: {} lines read, {} records across {} buckets",
            total_read, total_kept, num_buckets
        ));
    }

    Ok(())
}
