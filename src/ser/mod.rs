//! Canonical little-endian byte codec.
//!
//! Proofs travel as opaque byte strings; these helpers define the framing
//! (`u32` counts, `u64` field elements, raw 32-byte digests) and attach a
//! [`SerKind`] section plus a field name to every decoding failure.

mod collections;
mod cursor;
mod digest;
mod error;
mod felt;
mod ints;

pub use collections::{read_option, read_vec, write_option, write_vec};
pub use cursor::{ensure_consumed, ByteReader};
pub use digest::{read_digest, write_digest};
pub use error::{SerError, SerKind, SerResult};
pub use felt::{read_felt, read_felt_vec, write_felt, write_felt_vec};
pub use ints::{ensure_u32, read_bool, read_u32, read_u64, read_u8, write_bool, write_u32, write_u64, write_u8};
