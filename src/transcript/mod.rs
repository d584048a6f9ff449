//! Fiat-Shamir transcript orchestration.
//!
//! The transcript is organised by protocol rounds rather than by fixed
//! phases. Within round `r`:
//!
//! | Step | Label | Payload |
//! |------|-------|---------|
//! | Setup (round 0 only) | [`TranscriptLabel::Setup`] | Specification fingerprint and params hash. |
//! | Coins | [`TranscriptLabel::Coin`] | Nothing absorbed; the output is mixed back into the state. |
//! | Commit | [`TranscriptLabel::ColumnCommitment`] | Hash commitments of raw committed columns. |
//! | Commit | [`TranscriptLabel::Message`] | Columns sent in clear. |
//! | Commit | [`TranscriptLabel::Digest`] | Sent digest slots (Merkle roots, paths). |
//! | Commit | [`TranscriptLabel::QueryParams`] | Results of the round's result queries. |
//!
//! Coins of round `r` must be drawn before any round-`r` payload is
//! absorbed, and a payload can only be absorbed in the round it belongs to.
//! Violations surface as [`TranscriptError`]; they indicate a compiler or
//! runtime bug, never a property of the witness.
//!
//! Determinism guarantee: identical fingerprints, parameter hashes and
//! absorbed payloads yield identical coins for prover and verifier.

mod core;
mod types;

pub use core::Transcript;
pub use types::{TranscriptError, TranscriptEvent, TranscriptLabel};
