//! Compiler for multi-round interactive oracle proofs.
//!
//! A protocol is defined once as a [`Specification`]: columns, coins and
//! queries registered per round through the [`Builder`]. A [`Pipeline`] of
//! compiler passes rewrites the specification until nothing is left for the
//! verifier to check by reading full columns; [`prove`] then runs the
//! compiled protocol against a witness and [`verify`] replays it from the
//! proof alone.
//!
//! ```ignore
//! let spec = Builder::define(|b| {
//!     let x = b.commit("x", 8)?;
//!     b.global("x-is-bit", Expr::column(x) * (Expr::column(x) - Expr::constant(1)))?;
//!     Ok(())
//! })?;
//! let params = CompilerParamsBuilder::from_profile(BuiltinProfile::STANDARD_X2).build()?;
//! let compiled = Pipeline::commitment(params).compile(&spec)?;
//! let proof = prove(&compiled, &mut Witness::new().with("x", bits), &ProverOptions::default())?;
//! verify(&compiled, &proof)?;
//! ```
//!
//! Proofs are deterministic: the same compiled specification, parameters
//! and witness always yield the same bytes.

pub mod compiler;
pub mod fft;
pub mod field;
pub mod hash;
pub mod iop;
pub mod merkle;
pub mod params;
pub mod proof;
pub mod prover;
pub mod ser;
pub mod transcript;
pub mod utils;
pub mod verifier;

pub use compiler::{CompileError, CompileErrorKind, CompilerPass, Pipeline};
pub use field::FieldElement;
pub use iop::{Builder, DefinitionError, Expr, Specification};
pub use params::{BuiltinProfile, CompilerParams, CompilerParamsBuilder, HashFamily, ParamsError};
pub use proof::{deserialize_proof, serialize_proof, Proof};
pub use prover::{estimate, prove, AssignmentError, CostEstimate, ProverOptions, Witness, WitnessSource};
pub use verifier::{verify, VerificationError, VerificationFailure};
