use crate::constants::hash::{FNV1A64_OFFSET, FNV1A64_PRIME};

fn fnv1a64_update(mut state: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        state ^= u64::from(*byte);
        state = state.wrapping_mul(FNV1A64_PRIME);
    }
    state
}

/// Toolchain-independent hash of `value` mixed with `seed`.
///
/// Used to derive per-class shuffle seeds, so the result must not change
/// between compiler releases the way `DefaultHasher` output may.
pub fn stable_hash_str(seed: u64, value: &str) -> u64 {
    let state = fnv1a64_update(FNV1A64_OFFSET, &seed.to_le_bytes());
    fnv1a64_update(state, value.as_bytes())
}
