//! codesift: external-memory intersection engine for promotional code corpora.
//!
//! The input is a directory of line-delimited files, collectively far larger
//! than memory. A code is *valid* when it is 8–10 bytes long and appears in
//! at least two distinct input files. The pipeline finds every valid code in
//! two phases:
//!
//! 1. **Partition**: stream every input once, drop lines outside the length
//!    bounds, and append survivors to one of 1000 on-disk spill files chosen
//!    by a hash of the record bytes. Each spill line carries the index of the
//!    source file it came from.
//! 2. **Reduce**: process spill files in parallel; each reducer emits the
//!    records of its bucket that were seen under two or more distinct source
//!    indices.
//!
//! The union of the bucket results is sorted lexicographically and written
//! as a plain text artifact, one code per line. Peak memory is bounded by
//! the largest single bucket, not the corpus.

mod constants;
pub mod error;
pub mod hash;
pub mod loader;
pub mod logging;
mod partition;
pub mod pipeline;
pub mod reduce;
pub mod writer;

pub use error::{Result, SiftError};
pub use hash::bucket_for;
pub use pipeline::find_valid_codes;
pub use reduce::reduce_spill;
pub use writer::write_codes;

/// Progress sink for long-running phases.
///
/// Invoked only from the thread that drives the pipeline, so implementations
/// need no internal locking. Messages are human-readable status lines whose
/// exact wording is not contractual.
pub type ProgressFn = dyn Fn(&str);
