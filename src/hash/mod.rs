//! Hash primitives.
//!
//! * [`deterministic`]: Blake2s digests and the Blake2s-based XOF that back
//!   the Fiat-Shamir transcript and byte-oriented Merkle trees.
//! * [`mimc`]: a field-native MiMC compression function whose evaluation is
//!   cheap to express as polynomial constraints, used when a Merkle tree must
//!   later be re-verified inside a constraint system.

pub mod deterministic;
pub mod mimc;

pub use deterministic::{hash, hash_field_elements, Blake2sXof, Hash, Hasher, HexOutput};
