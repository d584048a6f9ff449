//! Proof objects and their canonical byte encoding.
//!
//! ```text
//! +-------------------------+-----------------------------------------+
//! | version (u8)            |                                         |
//! | spec digest (32B)       | fingerprint of the compiled spec        |
//! | commitments (u32 + 32B*)| hash commitments of raw columns         |
//! | messages (u32 + vec*)   | columns sent in the clear               |
//! | digests (u32 + vec*)    | sent digest slots (roots, paths)        |
//! | params (u32 + vec*)     | results of result queries               |
//! +-------------------------+-----------------------------------------+
//! ```
//!
//! Every vector is ordered by the registry order of the compiled
//! specification, see [`ProofLayout`].

mod ser;
mod types;

pub use ser::{deserialize_proof, serialize_proof};
pub use types::{Proof, ProofLayout, PROOF_VERSION};
