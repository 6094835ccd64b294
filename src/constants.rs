//! Constants used throughout the codesift library for sizing and progress tuning.

// Number of hash buckets the partition phase spreads records across.
// With ~3e8 input records and a well-distributed hash, each bucket holds
// ~3e5 entries, so every reducer's working set fits comfortably in memory.
pub(crate) const NUM_BUCKETS: usize = 1000;

// Length pre-filter applied during partitioning (inclusive bounds, in bytes).
pub(crate) const MIN_CODE_LEN: usize = 8;
pub(crate) const MAX_CODE_LEN: usize = 10;

// Input line scanner sizing.
pub(crate) const SCANNER_INITIAL_BUFFER: usize = 64 * 1024; // 64 KiB
pub(crate) const SCANNER_MAX_LINE: usize = 1024 * 1024; // 1 MiB hard cap

// Progress reporting intervals. Operational knobs, not contractual.
pub(crate) const PARTITION_PROGRESS_INTERVAL: u64 = 10_000_000; // lines per input file
pub(crate) const REDUCE_PROGRESS_INTERVAL: usize = 100; // bucket results
