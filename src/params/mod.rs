#![forbid(unsafe_code)]

//! Compiler parameter registry.
//!
//! [`CompilerParams`] is the single source of truth for every security and
//! performance relevant knob of a compilation pipeline. It is passed
//! explicitly to pipeline construction and its canonical digest
//! ([`CompilerParams::params_hash`]) is absorbed by every transcript, so a
//! proof produced under one parameter set never verifies under another.
//!
//! | Group | Description |
//! |-------|-------------|
//! | Vortex | Reed-Solomon blow-up, Merkle hash family, matrix width, spot-check override. |
//! | Security | Target soundness in bits, from which the spot-check count is derived. |
//! | Recursion | Number of self-recursion levels. |
//! | Limits | Round budget of the compiled protocol and the committed-cell ceiling used by the estimator. |
//! | Transcript | Protocol tag separating transcript families. |
//!
//! Consumers are expected to use the [`CompilerParamsBuilder`] which offers
//! safe defaults and pre-defined [`BuiltinProfile`] presets.

mod builder;
mod compiler_params;
mod hash;
mod ser;
mod types;
mod validate;

pub use builder::{BuiltinProfile, CompilerParamsBuilder};
pub use compiler_params::{CompilerParams, DEFAULT_MAX_MATRIX_WIDTH};
pub use hash::params_hash;
pub use ser::{deserialize_params, serialize_params};
pub use types::{HashFamily, LimitParams, RecursionParams, SecurityBudget, TranscriptParams, VortexParams};
pub use validate::ParamsError;
