//! Vortex: batched Reed-Solomon commitments with spot-checked openings.
//!
//! Committed columns of one round form a matrix, each extended to the
//! matrix width `s` and encoded with blow-up `b`. The width is the largest
//! committed size, capped by the parameters; a column of `n > s` rows is
//! split into `n / s` rows holding consecutive coefficient chunks, so that
//! `C(X) = sum_k X^(k*s) C_k(X)`. Leaf `j` of the round's Merkle tree hashes
//! the `j`-th symbol of every encoded row, so a single path opens one symbol
//! of all rows at once.
//!
//! Once every committed column is claimed at the evaluation point `x` the
//! protocol continues with
//!
//! | Round | Coin | Prover sends |
//! |-------|------|--------------|
//! | `E` | | chunk evaluations `C_k(x)` of split columns (in clear) |
//! | `E + 1` | `alpha` | combined row `U = sum_g alpha^(W-1-g) C_g` (in clear) |
//! | `E + 2` | `t` positions in `[0, s*b)` | opened symbols and Merkle paths |
//!
//! and the verifier checks that the chunks recombine to the claims, then,
//! per position, that the opened symbols combine to the encoding of `U`,
//! that the paths verify, and that `U(x)` equals the same combination of
//! the row evaluations.
//!
//! A row pins a polynomial below `s` coefficients only. Columns shorter
//! than `s` are therefore accepted only when a degree-adjusted reduction
//! (see [`crate::compiler::mpts`]) bounds their claims.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::mpts::degree_bounds;
use super::{CompileError, CompileErrorKind, CompilerPass};
use crate::iop::{
    CoinId, CoinKind, ColumnId, ColumnKind, ColumnOrigin, EvalPoint, Query, QueryId, SlotId, SlotVisibility,
    Specification, UnivariateEval,
};
use crate::params::{CompilerParams, HashFamily};
use crate::utils::{log2_strict, next_power_of_two};

mod prover;
mod verifier;

pub use prover::CommittedMatrix;

/// Committed columns of one round and the slot receiving their root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexMatrix {
    pub round: usize,
    pub columns: Vec<ColumnId>,
    /// Rows taken by each column, `max(1, n / s)`.
    pub chunks: Vec<usize>,
    pub root: SlotId,
}

impl VortexMatrix {
    pub fn num_rows(&self) -> usize {
        self.chunks.iter().sum()
    }
}

/// Evaluation of a public column, checked natively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicClaim {
    pub query: QueryId,
    pub index: usize,
    pub column: ColumnId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexCtx {
    pub name: String,
    /// Number of Vortex passes applied before this one.
    pub instance: usize,
    pub hash: HashFamily,
    pub blowup: usize,
    pub width: usize,
    pub spot_checks: usize,
    /// Merkle depth, `log2(width * blowup)`.
    pub depth: usize,
    pub matrices: Vec<VortexMatrix>,
    pub point: EvalPoint,
    pub eval_round: usize,
    /// `(query, result index)` claiming each committed column, in matrix
    /// order.
    pub claims: Vec<(QueryId, usize)>,
    pub public_claims: Vec<PublicClaim>,
    /// `C_k(x)` of every split column, in matrix order.
    pub split: Option<ColumnId>,
    pub alpha: CoinId,
    pub u_alpha: ColumnId,
    pub spots: CoinId,
    /// Symbol of row `g` at spot `j` sits at `j * W + g`.
    pub opened: ColumnId,
    /// Sibling `level` of matrix `k` at spot `j` sits at
    /// `(j * K + k) * depth + level`.
    pub paths: SlotId,
    /// The opening check is carried by a self-recursion trace.
    pub self_recursed: bool,
}

impl VortexCtx {
    /// Total number of matrix rows `W`.
    pub fn num_rows(&self) -> usize {
        self.matrices.iter().map(VortexMatrix::num_rows).sum()
    }

    /// Committed columns in matrix order, with their row count.
    pub fn columns(&self) -> impl Iterator<Item = (ColumnId, usize)> + '_ {
        self.matrices
            .iter()
            .flat_map(|matrix| matrix.columns.iter().copied().zip(matrix.chunks.iter().copied()))
    }

    pub fn codeword_len(&self) -> usize {
        self.width * self.blowup
    }
}

/// Vortex contexts registered in `spec`, oldest first.
pub(crate) fn contexts(spec: &Specification) -> Vec<Arc<VortexCtx>> {
    (0..spec.num_rounds())
        .flat_map(|round| spec.verifier_actions(round))
        .filter_map(|action| match action {
            VerifierAction::VortexOpening(ctx) => Some(Arc::clone(ctx)),
            _ => None,
        })
        .collect()
}

/// Points every action holding `old` at `new` instead.
pub(crate) fn replace_context(spec: &mut Specification, old: &Arc<VortexCtx>, new: &Arc<VortexCtx>) {
    let swap = |ctx: &mut Arc<VortexCtx>| {
        if Arc::ptr_eq(ctx, old) {
            *ctx = Arc::clone(new);
        }
    };
    for action in spec.prover_actions.iter_mut().flatten() {
        match action {
            ProverAction::VortexCommit { ctx, .. }
            | ProverAction::VortexSplit(ctx)
            | ProverAction::VortexCombine(ctx)
            | ProverAction::VortexOpen(ctx) => swap(ctx),
            _ => {}
        }
    }
    for action in spec.verifier_actions.iter_mut().flatten() {
        match action {
            VerifierAction::VortexPublicEvals(ctx) | VerifierAction::VortexOpening(ctx) => swap(ctx),
            _ => {}
        }
    }
}

/// Commits every remaining committed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VortexCompiler {
    hash: HashFamily,
    blowup: usize,
    max_width: usize,
    spot_checks: usize,
}

impl VortexCompiler {
    pub fn new(params: &CompilerParams) -> Self {
        Self {
            hash: params.merkle_hash(),
            blowup: params.blowup(),
            max_width: params.max_matrix_width(),
            spot_checks: params.spot_checks(),
        }
    }
}

impl CompilerPass for VortexCompiler {
    fn name(&self) -> &'static str {
        "vortex"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "vortex"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let fail = |kind: CompileErrorKind| CompileError::new(self.name(), kind);
        let committed: Vec<(ColumnId, usize, usize)> = spec
            .columns()
            .iter()
            .filter(|(_, info)| info.kind == ColumnKind::Committed)
            .map(|(id, info)| (id, info.size, info.round))
            .collect();
        let mut evals: Vec<(QueryId, String, usize, UnivariateEval)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::UnivariateEval(q) => Some((id, info.name.clone(), info.round, q.clone())),
                _ => None,
            })
            .collect();
        if committed.is_empty() {
            // Only public columns are evaluated; the verifier reads them.
            for (id, name, round, eval) in &evals {
                for column in &eval.columns {
                    let info = spec.columns().info(*column);
                    if !info.kind.is_public() {
                        return Err(CompileError::on_query(
                            self.name(),
                            name,
                            CompileErrorKind::OutsideCommittedSet(info.name.clone()),
                        ));
                    }
                }
                spec.push_verifier_action(*round, VerifierAction::Plaintext(*id));
                spec.mark_compiled(*id, self.name());
            }
            return Ok(spec);
        }

        let instance = spec.applied_passes().iter().filter(|pass| pass.as_str() == "vortex").count();
        let name = spec.fresh_name(&format!("VORTEX_{instance}"));

        let width = committed
            .iter()
            .map(|(_, size, _)| *size)
            .max()
            .unwrap_or(1)
            .min(self.max_width);
        let bounds = degree_bounds(&spec);
        for (_, query, _, eval) in &evals {
            for column in &eval.columns {
                let info = spec.columns().info(*column);
                if info.kind != ColumnKind::Committed || info.size >= width {
                    continue;
                }
                if bounds.get(column).map_or(true, |bound| *bound < width) {
                    return Err(CompileError::on_query(
                        self.name(),
                        query,
                        CompileErrorKind::IrregularDimensions(format!(
                            "column `{}` has {} rows, fewer than the matrix width {width}, and no degree-adjusted reduction bounds its claims",
                            info.name, info.size
                        )),
                    ));
                }
            }
        }

        let last_commit = committed.iter().map(|(_, _, round)| *round).max().unwrap_or(0);
        let point = match evals.first() {
            Some((_, _, _, first)) => {
                if let Some((_, other, _, _)) = evals.iter().find(|(_, _, _, eval)| eval.point != first.point) {
                    return Err(CompileError::on_query(
                        self.name(),
                        other,
                        CompileErrorKind::Precondition(
                            "evaluation claims at several points, reduce them to one first".into(),
                        ),
                    ));
                }
                first.point.clone()
            }
            None => {
                let coin = spec
                    .register_coin(spec.fresh_name(&format!("{name}_X")), last_commit + 1, CoinKind::Field)
                    .map_err(|error| fail(error.into()))?;
                EvalPoint::Coin(coin)
            }
        };
        let point_round = point
            .coin()
            .map(|coin| spec.coins().info(coin).round)
            .unwrap_or(0);
        let eval_round = evals
            .iter()
            .map(|(_, _, round, _)| *round)
            .chain([last_commit, point_round])
            .max()
            .unwrap_or(0);

        // Every committed column needs a claim at the common point.
        let mut claimed: BTreeMap<ColumnId, (QueryId, usize)> = BTreeMap::new();
        let mut public_claims = Vec::new();
        for (id, query, _, eval) in &evals {
            for (index, column) in eval.columns.iter().enumerate() {
                let info = spec.columns().info(*column);
                match info.kind {
                    ColumnKind::Committed => {
                        claimed.entry(*column).or_insert((*id, index));
                    }
                    kind if kind.is_public() => public_claims.push(PublicClaim {
                        query: *id,
                        index,
                        column: *column,
                    }),
                    _ => {
                        return Err(CompileError::on_query(
                            self.name(),
                            query,
                            CompileErrorKind::OutsideCommittedSet(info.name.clone()),
                        ))
                    }
                }
            }
        }
        let unclaimed: Vec<ColumnId> = committed
            .iter()
            .map(|(id, _, _)| *id)
            .filter(|id| !claimed.contains_key(id))
            .collect();
        if !unclaimed.is_empty() {
            let extra_name = spec.fresh_name(&format!("{name}_EVAL"));
            let extra = UnivariateEval {
                columns: unclaimed.clone(),
                point: point.clone(),
            };
            let id = spec
                .register_query(extra_name.clone(), eval_round, Query::UnivariateEval(extra.clone()))
                .map_err(|error| fail(error.into()))?;
            for (index, column) in unclaimed.iter().enumerate() {
                claimed.insert(*column, (id, index));
            }
            evals.push((id, extra_name, eval_round, extra));
        }

        let mut by_round: BTreeMap<usize, Vec<(ColumnId, usize)>> = BTreeMap::new();
        for (id, size, round) in &committed {
            by_round.entry(*round).or_default().push((*id, (*size / width).max(1)));
        }
        let mut matrices = Vec::with_capacity(by_round.len());
        for (round, columns) in by_round {
            let root = spec
                .register_slot(
                    spec.fresh_name(&format!("{name}_ROOT_R{round}")),
                    round,
                    1,
                    SlotVisibility::Sent,
                )
                .map_err(|error| fail(error.into()))?;
            let (columns, chunks) = columns.into_iter().unzip();
            matrices.push(VortexMatrix {
                round,
                columns,
                chunks,
                root,
            });
        }
        let claims: Vec<(QueryId, usize)> = matrices
            .iter()
            .flat_map(|matrix| matrix.columns.iter())
            .map(|column| claimed[column])
            .collect();

        let total: usize = matrices.iter().map(VortexMatrix::num_rows).sum();
        let split_rows: usize = matrices
            .iter()
            .flat_map(|matrix| matrix.chunks.iter())
            .filter(|chunks| **chunks > 1)
            .sum();
        let codeword_len = width * self.blowup;
        let depth = log2_strict(codeword_len);
        let register = |spec: &mut Specification| -> Result<_, crate::iop::DefinitionError> {
            let split = if split_rows > 0 {
                Some(spec.register_column(
                    spec.fresh_name(&format!("{name}_CHUNKS")),
                    next_power_of_two(split_rows),
                    eval_round,
                    ColumnKind::Proof,
                    ColumnOrigin::Derived,
                )?)
            } else {
                None
            };
            let alpha = spec.register_coin(spec.fresh_name(&format!("{name}_ALPHA")), eval_round + 1, CoinKind::Field)?;
            let u_alpha = spec.register_column(
                spec.fresh_name(&format!("{name}_UALPHA")),
                width,
                eval_round + 1,
                ColumnKind::Proof,
                ColumnOrigin::Derived,
            )?;
            let spots = spec.register_coin(
                spec.fresh_name(&format!("{name}_SPOTS")),
                eval_round + 2,
                CoinKind::Integers {
                    count: self.spot_checks,
                    bound: codeword_len,
                },
            )?;
            let opened = spec.register_column(
                spec.fresh_name(&format!("{name}_OPENED")),
                next_power_of_two(self.spot_checks * total),
                eval_round + 2,
                ColumnKind::Proof,
                ColumnOrigin::Derived,
            )?;
            let paths = spec.register_slot(
                spec.fresh_name(&format!("{name}_PATHS")),
                eval_round + 2,
                self.spot_checks * matrices.len() * depth,
                SlotVisibility::Sent,
            )?;
            Ok((split, alpha, u_alpha, spots, opened, paths))
        };
        let (split, alpha, u_alpha, spots, opened, paths) = register(&mut spec).map_err(|error| fail(error.into()))?;

        for (id, _, _) in &committed {
            spec.set_column_kind(*id, ColumnKind::Ignored);
        }
        for (id, _, _, _) in &evals {
            spec.mark_compiled(*id, self.name());
        }

        let ctx = Arc::new(VortexCtx {
            name,
            instance,
            hash: self.hash,
            blowup: self.blowup,
            width,
            spot_checks: self.spot_checks,
            depth,
            matrices,
            point,
            eval_round,
            claims,
            public_claims,
            split,
            alpha,
            u_alpha,
            spots,
            opened,
            paths,
            self_recursed: false,
        });
        for (index, matrix) in ctx.matrices.iter().enumerate() {
            spec.push_prover_action(
                matrix.round,
                ProverAction::VortexCommit {
                    ctx: Arc::clone(&ctx),
                    matrix: index,
                },
            );
        }
        if ctx.split.is_some() {
            spec.push_prover_action(eval_round, ProverAction::VortexSplit(Arc::clone(&ctx)));
        }
        spec.push_prover_action(eval_round + 1, ProverAction::VortexCombine(Arc::clone(&ctx)));
        spec.push_prover_action(eval_round + 2, ProverAction::VortexOpen(Arc::clone(&ctx)));
        spec.push_verifier_action(eval_round, VerifierAction::VortexPublicEvals(Arc::clone(&ctx)));
        spec.push_verifier_action(eval_round + 2, VerifierAction::VortexOpening(Arc::clone(&ctx)));
        debug!(
            name = %ctx.name,
            matrices = ctx.matrices.len(),
            columns = committed.len(),
            rows = total,
            width,
            spot_checks = self.spot_checks,
            "columns committed"
        );
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;
    use crate::iop::Builder;
    use crate::params::{BuiltinProfile, CompilerParamsBuilder};

    fn params() -> CompilerParams {
        CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST).build().unwrap()
    }

    #[test]
    fn one_matrix_per_commitment_round() {
        let spec = Builder::define(|b| {
            b.commit("a", 8)?;
            b.commit("b", 4)?;
            b.next_round();
            b.commit("c", 8)?;
            Ok(())
        })
        .unwrap();
        let compiled = VortexCompiler::new(&params()).compile(spec).unwrap();
        let ctx = contexts(&compiled).pop().unwrap();
        assert_eq!(ctx.matrices.len(), 2);
        assert_eq!(ctx.width, 8);
        assert_eq!(ctx.depth, 5);
        // Own point coin at round 2, alpha at 3, spots at 4.
        assert_eq!(ctx.eval_round, 2);
        assert_eq!(compiled.num_rounds(), 5);
        for name in ["a", "b", "c"] {
            let id = compiled.column_id(name).unwrap();
            assert_eq!(compiled.columns().get(id).unwrap().kind, ColumnKind::Ignored);
        }
        assert!(compiled.pending_queries().is_empty());
    }

    #[test]
    fn evaluations_at_different_points_are_rejected() {
        let spec = Builder::define(|b| {
            let a = b.commit("a", 8)?;
            b.univariate("a-at-1", &[a], EvalPoint::Constant(FieldElement::from(1u64)))?;
            b.univariate("a-at-2", &[a], EvalPoint::Constant(FieldElement::from(2u64)))?;
            Ok(())
        })
        .unwrap();
        let error = VortexCompiler::new(&params()).compile(spec).unwrap_err();
        assert!(matches!(error.kind, CompileErrorKind::Precondition(_)));
    }

    #[test]
    fn wide_columns_take_one_row_per_chunk() {
        let params = CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST)
            .matrix_width(4)
            .build()
            .unwrap();
        let spec = Builder::define(|b| {
            b.commit("a", 16)?;
            b.commit("b", 4)?;
            Ok(())
        })
        .unwrap();
        let compiled = VortexCompiler::new(&params).compile(spec).unwrap();
        let ctx = contexts(&compiled).pop().unwrap();
        assert_eq!(ctx.width, 4);
        assert_eq!(ctx.matrices[0].chunks, vec![4, 1]);
        assert_eq!(ctx.num_rows(), 5);
        let split = compiled.columns().get(ctx.split.unwrap()).unwrap();
        assert_eq!((split.size, split.round, split.kind), (4, ctx.eval_round, ColumnKind::Proof));
        let opened = compiled.columns().get(ctx.opened).unwrap();
        assert_eq!(opened.size, next_power_of_two(ctx.spot_checks * 5));
    }

    #[test]
    fn narrow_columns_stay_whole() {
        let compiled = VortexCompiler::new(&params())
            .compile(
                Builder::define(|b| {
                    b.commit("a", 8)?;
                    Ok(())
                })
                .unwrap(),
            )
            .unwrap();
        let ctx = contexts(&compiled).pop().unwrap();
        assert_eq!(ctx.split, None);
        assert_eq!(ctx.num_rows(), 1);
    }

    fn short_claim() -> Specification {
        Builder::define(|b| {
            let a = b.commit("a", 4)?;
            b.commit("b", 8)?;
            b.univariate("a-at-3", &[a], EvalPoint::Constant(FieldElement::from(3u64)))?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn short_claims_need_a_degree_bound() {
        let error = VortexCompiler::new(&params()).compile(short_claim()).unwrap_err();
        assert_eq!(error.query.as_deref(), Some("a-at-3"));
        assert!(matches!(error.kind, CompileErrorKind::IrregularDimensions(_)));

        let reduced = crate::compiler::MultiPointReduction.compile(short_claim()).unwrap();
        let compiled = VortexCompiler::new(&params()).compile(reduced).unwrap();
        assert_eq!(contexts(&compiled).pop().unwrap().width, 8);
    }
}
