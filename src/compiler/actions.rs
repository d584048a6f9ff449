//! Closed sets of prover and verifier actions.
//!
//! Passes register actions per round. Each variant holds the shared context
//! of the pass instance that created it; several actions (and, after
//! self-recursion, several passes) may point at the same context.

use std::sync::Arc;

use super::global::GlobalCtx;
use super::inner_product::InnerProductCtx;
use super::local::LocalCtx;
use super::lookup::LookupCtx;
use super::mpts::MptsCtx;
use super::opening::OpeningCtx;
use super::permutation::PermutationCtx;
use super::selfrecursion::SelfRecursionCtx;
use super::vortex::VortexCtx;
use crate::iop::check::check_query;
use crate::iop::QueryId;
use crate::prover::{AssignmentError, ProverRuntime};
use crate::verifier::{VerificationError, VerifierRuntime};

/// Computes derived columns or digests inside a round.
#[derive(Debug, Clone)]
pub enum ProverAction {
    PermutationProducts(Arc<PermutationCtx>),
    LookupMultiplicities(Arc<LookupCtx>),
    LookupSums(Arc<LookupCtx>),
    InnerProductSums(Arc<InnerProductCtx>),
    GlobalQuotient(Arc<GlobalCtx>),
    MptsQuotient(Arc<MptsCtx>),
    VortexCommit { ctx: Arc<VortexCtx>, matrix: usize },
    VortexSplit(Arc<VortexCtx>),
    VortexCombine(Arc<VortexCtx>),
    VortexOpen(Arc<VortexCtx>),
    SelfRecursionTrace(Arc<SelfRecursionCtx>),
}

impl ProverAction {
    pub fn label(&self) -> &'static str {
        match self {
            ProverAction::PermutationProducts(_) => "permutation-products",
            ProverAction::LookupMultiplicities(_) => "lookup-multiplicities",
            ProverAction::LookupSums(_) => "lookup-sums",
            ProverAction::InnerProductSums(_) => "inner-product-sums",
            ProverAction::GlobalQuotient(_) => "global-quotient",
            ProverAction::MptsQuotient(_) => "mpts-quotient",
            ProverAction::VortexCommit { .. } => "vortex-commit",
            ProverAction::VortexSplit(_) => "vortex-split",
            ProverAction::VortexCombine(_) => "vortex-combine",
            ProverAction::VortexOpen(_) => "vortex-open",
            ProverAction::SelfRecursionTrace(_) => "self-recursion-trace",
        }
    }

    pub fn run(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        match self {
            ProverAction::PermutationProducts(ctx) => ctx.assign_products(rt),
            ProverAction::LookupMultiplicities(ctx) => ctx.assign_multiplicities(rt),
            ProverAction::LookupSums(ctx) => ctx.assign_sums(rt),
            ProverAction::InnerProductSums(ctx) => ctx.assign_sums(rt),
            ProverAction::GlobalQuotient(ctx) => ctx.assign_quotient(rt),
            ProverAction::MptsQuotient(ctx) => ctx.assign_quotient(rt),
            ProverAction::VortexCommit { ctx, matrix } => ctx.commit(rt, *matrix),
            ProverAction::VortexSplit(ctx) => ctx.evaluate_chunks(rt),
            ProverAction::VortexCombine(ctx) => ctx.combine(rt),
            ProverAction::VortexOpen(ctx) => ctx.open(rt),
            ProverAction::SelfRecursionTrace(ctx) => ctx.assign_trace(rt),
        }
    }
}

/// Check run by the verifier once its round is replayed.
#[derive(Debug, Clone)]
pub enum VerifierAction {
    /// Plaintext check of a query on public columns.
    Plaintext(QueryId),
    PermutationProduct(Arc<PermutationCtx>),
    LookupSum(Arc<LookupCtx>),
    InnerProductResult(Arc<InnerProductCtx>),
    LocalConstraint(Arc<LocalCtx>),
    GlobalIdentity(Arc<GlobalCtx>),
    OpeningConsistency(Arc<OpeningCtx>),
    MptsCheck(Arc<MptsCtx>),
    VortexPublicEvals(Arc<VortexCtx>),
    VortexOpening(Arc<VortexCtx>),
    SelfRecursionClaim(Arc<SelfRecursionCtx>),
}

impl VerifierAction {
    pub fn label(&self) -> &'static str {
        match self {
            VerifierAction::Plaintext(_) => "plaintext",
            VerifierAction::PermutationProduct(_) => "permutation-product",
            VerifierAction::LookupSum(_) => "lookup-sum",
            VerifierAction::InnerProductResult(_) => "inner-product-result",
            VerifierAction::LocalConstraint(_) => "local-constraint",
            VerifierAction::GlobalIdentity(_) => "global-identity",
            VerifierAction::OpeningConsistency(_) => "opening-consistency",
            VerifierAction::MptsCheck(_) => "mpts-check",
            VerifierAction::VortexPublicEvals(_) => "vortex-public-evals",
            VerifierAction::VortexOpening(ctx) if ctx.self_recursed => "vortex-opening-recursed",
            VerifierAction::VortexOpening(_) => "vortex-opening",
            VerifierAction::SelfRecursionClaim(_) => "self-recursion-claim",
        }
    }

    pub fn run(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        match self {
            VerifierAction::Plaintext(id) => {
                let spec = rt.spec();
                check_query(spec, *id, rt).map_err(|failure| {
                    let name = spec.queries().get(*id).map(|info| info.name.clone()).unwrap_or_default();
                    VerificationError::new(name, failure)
                })
            }
            VerifierAction::PermutationProduct(ctx) => ctx.check_products(rt),
            VerifierAction::LookupSum(ctx) => ctx.check_sums(rt),
            VerifierAction::InnerProductResult(ctx) => ctx.check_results(rt),
            VerifierAction::LocalConstraint(ctx) => ctx.check(rt),
            VerifierAction::GlobalIdentity(ctx) => ctx.check_identity(rt),
            VerifierAction::OpeningConsistency(ctx) => ctx.check(rt),
            VerifierAction::MptsCheck(ctx) => ctx.check(rt),
            VerifierAction::VortexPublicEvals(ctx) => ctx.check_public_evals(rt),
            VerifierAction::VortexOpening(ctx) => ctx.check_opening(rt),
            VerifierAction::SelfRecursionClaim(ctx) => ctx.check_claim(rt),
        }
    }
}
