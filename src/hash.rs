//! Bucket assignment for the partition phase.
//!
//! Records are routed to spill files by a 32-bit FNV-1a hash of their raw
//! bytes, reduced modulo the partition count. FNV-1a is cheap, branch-free,
//! and distributes short alphanumeric strings well; the assignment is stable
//! across runs and across machines, which keeps spill layouts reproducible.

const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a over a byte slice.
#[inline]
fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Map a record to a bucket index in `[0, num_buckets)`.
///
/// Pure function of the record bytes and the partition count.
///
/// # Panics
/// Panics if `num_buckets` is zero.
#[inline]
pub fn bucket_for(record: &[u8], num_buckets: usize) -> usize {
    assert!(num_buckets > 0, "num_buckets must be positive");
    fnv1a_32(record) as usize % num_buckets
}
