//! Verifier runtime.
//!
//! [`verify`] replays the prover's transcript from the proof alone: per
//! round it draws the coins, rebuilds the verifier-defined columns, absorbs
//! what the prover sent and runs the round's verifier actions. The first
//! failing check rejects the proof; the error names the query it belongs to.

use tracing::{info, instrument, warn};

use crate::iop::Specification;
use crate::proof::Proof;
use crate::transcript::TranscriptEvent;

mod errors;
mod runtime;

pub use errors::{VerificationError, VerificationFailure};
pub use runtime::VerifierRuntime;

/// Accepts or rejects `proof` for the compiled `spec`.
pub fn verify(spec: &Specification, proof: &Proof) -> Result<(), VerificationError> {
    run(spec, proof, false).map(|_| ())
}

/// Like [`verify`], also returning the replayed transcript events.
pub fn verify_audited(spec: &Specification, proof: &Proof) -> Result<Vec<TranscriptEvent>, VerificationError> {
    run(spec, proof, true)
}

#[instrument(level = "debug", skip_all, fields(rounds = spec.num_rounds()))]
fn run(spec: &Specification, proof: &Proof, audit: bool) -> Result<Vec<TranscriptEvent>, VerificationError> {
    let outcome = replay(spec, proof, audit);
    match &outcome {
        Ok(_) => info!(rounds = spec.num_rounds(), "proof accepted"),
        Err(error) => warn!(query = %error.query, reason = %error.reason, "proof rejected"),
    }
    outcome
}

fn replay(spec: &Specification, proof: &Proof, audit: bool) -> Result<Vec<TranscriptEvent>, VerificationError> {
    if let Some((_, info)) = spec.queries().pending().next() {
        return Err(VerificationError::new(
            info.name.clone(),
            VerificationFailure::Uncompiled,
        ));
    }
    let mut runtime = VerifierRuntime::load(spec, proof, audit)?;
    for round in 0..spec.num_rounds() {
        runtime.begin_round(round)?;
        runtime.absorb_round()?;
        for action in spec.verifier_actions(round) {
            action.run(&runtime)?;
        }
    }
    Ok(runtime.into_events())
}
