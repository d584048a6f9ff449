//! Utility helpers shared across subsystems.

pub mod parallel;
pub mod serialization;

pub use parallel::{par_map, par_try_map, preferred_chunk_size};
pub use serialization::ProofBytes;

/// Smallest power of two `>= value` (and at least one).
pub fn next_power_of_two(value: usize) -> usize {
    value.max(1).next_power_of_two()
}

/// `log2` of a power of two.
pub fn log2_strict(value: usize) -> usize {
    value.trailing_zeros() as usize
}
