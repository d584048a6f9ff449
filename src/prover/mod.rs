//! Prover runtime.
//!
//! `prove` walks the rounds of a compiled specification:
//!
//! 1. advance the transcript and draw the round's coins,
//! 2. materialise verifier-defined columns,
//! 3. let the [`WitnessSource`] assign the round's witness columns,
//! 4. run the prover actions registered by compiler passes,
//! 5. compute query results, check the round's queries (fail closed) and
//!    absorb everything that is sent.

use tracing::{info, instrument};

use crate::proof::Proof;
use crate::iop::{ColumnOrigin, Specification};
use crate::transcript::TranscriptEvent;

mod errors;
mod estimate;
mod options;
mod runtime;
mod witness;

pub use errors::AssignmentError;
pub use estimate::{estimate, CostEstimate};
pub use options::ProverOptions;
pub use runtime::ProverRuntime;
pub use witness::{FnWitness, RoundAssignment, Witness, WitnessSource};

/// Produces a proof that `witness` satisfies `spec`.
pub fn prove(
    spec: &Specification,
    witness: &mut dyn WitnessSource,
    options: &ProverOptions,
) -> Result<Proof, AssignmentError> {
    run(spec, witness, options, false).map(|(proof, _)| proof)
}

/// Like [`prove`], also returning the transcript audit trail.
pub fn prove_audited(
    spec: &Specification,
    witness: &mut dyn WitnessSource,
    options: &ProverOptions,
) -> Result<(Proof, Vec<TranscriptEvent>), AssignmentError> {
    run(spec, witness, options, true).map(|(proof, events)| (proof, events.unwrap_or_default()))
}

#[instrument(level = "debug", skip_all, fields(rounds = spec.num_rounds()))]
fn run(
    spec: &Specification,
    witness: &mut dyn WitnessSource,
    options: &ProverOptions,
    audit: bool,
) -> Result<(Proof, Option<Vec<TranscriptEvent>>), AssignmentError> {
    let cost = estimate(spec);
    let limit = match (spec.cell_limit, options.max_committed_cells) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    if let Some(limit) = limit {
        if cost.committed_cells > limit {
            return Err(AssignmentError::ResourceLimit {
                estimated: cost.committed_cells,
                limit,
            });
        }
    }

    let mut runtime = ProverRuntime::new(spec, options, audit);
    for round in 0..spec.num_rounds() {
        runtime.begin_round(round)?;
        witness.assign_round(round, &mut RoundAssignment::new(&mut runtime))?;
        runtime.ensure_assigned(ColumnOrigin::Witness)?;
        for action in spec.prover_actions(round) {
            action.run(&mut runtime)?;
        }
        runtime.close_round()?;
    }
    let (proof, events) = runtime.finish()?;
    info!(
        rounds = spec.num_rounds(),
        messages = proof.messages.len(),
        digests = proof.digests.iter().map(Vec::len).sum::<usize>(),
        "proof generated"
    );
    Ok((proof, events))
}
