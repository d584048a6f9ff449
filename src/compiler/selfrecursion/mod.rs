//! Self-recursion: the Vortex opening check becomes constraints.
//!
//! The latest Vortex instance stops sending its opened symbols and Merkle
//! paths. Instead the prover commits to a trace that recomputes every
//! opened leaf and path with MiMC, and to the combined row `U`. Three
//! lookups tie the trace to what the verifier knows:
//!
//! * block roots against the matrix roots,
//! * block positions against the sampled spots,
//! * the per-spot combination of opened symbols against evaluations of `U`
//!   at `w^{q_j}`, i.e. the symbols of the encoding of `U`.
//!
//! The claim `U(x) = sum_g alpha^(W-1-g) y_g` becomes an evaluation query on
//! `U` checked against the claimed `y_g`. Everything new is again pending,
//! so the lowering passes and a fresh Vortex close the loop.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::vortex::{self, VortexCtx};
use super::{CompileError, CompileErrorKind, CompilerPass};
use crate::field::FieldElement;
use crate::hash::mimc::{round_constants, MIMC_ROUNDS};
use crate::iop::{
    ColumnId, ColumnKind, ColumnOrigin, DefinitionError, EvalPoint, Expr, GlobalConstraint, Inclusion, Query,
    QueryId, SlotVisibility, Specification, UnivariateEval, VerifierColumn,
};
use crate::params::HashFamily;
use crate::prover::{AssignmentError, ProverRuntime};
use crate::utils::next_power_of_two;
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

mod trace;

use trace::{layout, trace_size, RowKind, Selectors, Trace};

/// Committed trace columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceColumns {
    pub key: ColumnId,
    pub msg: ColumnId,
    pub sib: ColumnId,
    pub bit: ColumnId,
    pub pos: ColumnId,
    pub acc: ColumnId,
    pub out: ColumnId,
    /// Intermediate permutation states `x_1..=x_R`.
    pub states: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRecursionCtx {
    pub name: String,
    pub vortex: VortexCtx,
    pub rows: usize,
    pub columns: TraceColumns,
    /// `U` at the Vortex evaluation point.
    pub claim: QueryId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelfRecursionCompiler;

impl CompilerPass for SelfRecursionCompiler {
    fn name(&self) -> &'static str {
        "self-recursion"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "self-recursion"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let fail = |kind: CompileErrorKind| CompileError::new(self.name(), kind);
        let old = vortex::contexts(&spec)
            .into_iter()
            .rev()
            .find(|ctx| !ctx.self_recursed)
            .ok_or_else(|| fail(CompileErrorKind::Precondition("no Vortex commitment to recurse on".into())))?;
        if old.hash != HashFamily::Mimc {
            return Err(fail(CompileErrorKind::Precondition(format!(
                "`{}` hashes with {:?}, self-recursion needs a field-native hash",
                old.name, old.hash
            ))));
        }
        let mut recursed = (*old).clone();
        recursed.self_recursed = true;
        let recursed = Arc::new(recursed);
        vortex::replace_context(&mut spec, &old, &recursed);

        spec.set_column_kind(recursed.u_alpha, ColumnKind::Committed);
        spec.set_column_kind(recursed.opened, ColumnKind::Ignored);
        spec.set_slot_visibility(recursed.paths, SlotVisibility::ProverOnly);

        let name = spec.fresh_name(&format!("{}_SR", recursed.name));
        let ctx = arithmetize(&mut spec, &name, &recursed).map_err(|error| fail(error.into()))?;
        let opening_round = recursed.eval_round + 2;
        debug!(
            name = %ctx.name,
            rows = ctx.rows,
            spot_checks = recursed.spot_checks,
            matrices = recursed.matrices.len(),
            "opening check arithmetized"
        );
        let ctx = Arc::new(ctx);
        spec.push_prover_action(opening_round, ProverAction::SelfRecursionTrace(Arc::clone(&ctx)));
        spec.push_verifier_action(recursed.eval_round + 1, VerifierAction::SelfRecursionClaim(ctx));
        Ok(spec)
    }
}

fn arithmetize(spec: &mut Specification, name: &str, vortex: &VortexCtx) -> Result<SelfRecursionCtx, DefinitionError> {
    let round = vortex.eval_round + 2;
    let rows = trace_size(vortex);
    let spots = vortex.spot_checks;
    let matrices = vortex.matrices.len();
    let selectors = Selectors::new(&layout(vortex));

    let fixed = |spec: &mut Specification, suffix: &str, values: Vec<FieldElement>| {
        spec.register_precomputed(spec.fresh_name(&format!("{name}_{suffix}")), Arc::new(values))
    };
    let leaf = fixed(spec, "LEAF", selectors.leaf)?;
    let leaf_start = fixed(spec, "LEAF_START", selectors.leaf_start)?;
    let path = fixed(spec, "PATH", selectors.path)?;
    let path_start = fixed(spec, "PATH_START", selectors.path_start)?;
    let block_end = fixed(spec, "BLOCK_END", selectors.block_end)?;
    let spot_start = fixed(spec, "SPOT_START", selectors.spot_start)?;
    let spot_end = fixed(spec, "SPOT_END", selectors.spot_end)?;
    let pow2 = fixed(spec, "POW2", selectors.pow2)?;
    let spot_id = fixed(spec, "SPOT_ID", selectors.spot_id)?;
    let matrix_id = fixed(spec, "MATRIX_ID", selectors.matrix_id)?;
    let index_table = |count: usize| {
        let size = next_power_of_two(count);
        (0..size)
            .map(|i| FieldElement::from(i.min(count) as u64))
            .collect::<Vec<_>>()
    };
    let matrix_table = fixed(spec, "KIDX", index_table(matrices))?;
    let spot_table = fixed(spec, "IDX_T", index_table(spots))?;

    let committed = |spec: &mut Specification, suffix: &str| {
        spec.register_column(
            spec.fresh_name(&format!("{name}_{suffix}")),
            rows,
            round,
            ColumnKind::Committed,
            ColumnOrigin::Derived,
        )
    };
    let key = committed(spec, "KEY")?;
    let msg = committed(spec, "MSG")?;
    let sib = committed(spec, "SIB")?;
    let bit = committed(spec, "BIT")?;
    let pos = committed(spec, "POS")?;
    let acc = committed(spec, "ACC")?;
    let out = committed(spec, "OUT")?;
    let mut states = Vec::with_capacity(MIMC_ROUNDS);
    for i in 1..=MIMC_ROUNDS {
        states.push(committed(spec, &format!("S_{i}"))?);
    }

    let spot_values = spec.register_verifier_column(
        spec.fresh_name(&format!("{name}_QCOL")),
        next_power_of_two(spots),
        round,
        VerifierColumn::IntegerCoin { coin: vortex.spots },
    )?;
    let roots = spec.register_verifier_column(
        spec.fresh_name(&format!("{name}_ROOTS")),
        next_power_of_two(matrices),
        round,
        VerifierColumn::DigestSlots {
            slots: vortex.matrices.iter().map(|matrix| matrix.root).collect(),
        },
    )?;
    let mut symbol_evals = Vec::with_capacity(spots);
    for j in 0..spots {
        symbol_evals.push(spec.register_query(
            spec.fresh_name(&format!("{name}_SYMBOL_{j}")),
            round,
            Query::UnivariateEval(UnivariateEval {
                columns: vec![vortex.u_alpha],
                point: EvalPoint::RootPower {
                    coin: vortex.spots,
                    index: j,
                    domain_size: vortex.codeword_len(),
                },
            }),
        )?);
    }
    let symbols = spec.register_verifier_column(
        spec.fresh_name(&format!("{name}_EVALS")),
        next_power_of_two(spots),
        round + 1,
        VerifierColumn::QueryResults { queries: symbol_evals },
    )?;

    let c = Expr::column;
    let prev = |column: ColumnId| Expr::shifted(column, -1);
    let one = || Expr::constant(1);
    let global = |spec: &mut Specification, suffix: &str, expr: Expr| {
        spec.register_query(
            spec.fresh_name(&format!("{name}_{suffix}")),
            round,
            Query::Global(GlobalConstraint {
                expr,
                domain_size: rows,
                cyclic: true,
            }),
        )
    };

    for (i, constant) in round_constants().iter().enumerate() {
        let input = if i == 0 { c(msg) } else { c(states[i - 1]) };
        let y = input + c(key) + Expr::Const(*constant);
        let y2 = y.clone() * y.clone();
        let y4 = y2.clone() * y2.clone();
        global(spec, &format!("MIMC_{}", i + 1), c(states[i]) - y4 * y2 * y)?;
    }
    global(
        spec,
        "COMPRESS",
        c(out) - c(states[MIMC_ROUNDS - 1]) - Expr::constant(2) * c(key) - c(msg),
    )?;
    global(
        spec,
        "LEAF_CHAIN",
        c(leaf) * (c(key) - (one() - c(leaf_start)) * prev(out)),
    )?;
    global(
        spec,
        "PATH_KEY",
        c(path) * (c(key) - c(bit) * c(sib) - (one() - c(bit)) * prev(out)),
    )?;
    global(
        spec,
        "PATH_MSG",
        c(path) * (c(msg) - c(bit) * prev(out) - (one() - c(bit)) * c(sib)),
    )?;
    global(spec, "BIT_BOOLEAN", c(bit) * (c(bit) - one()))?;
    global(spec, "BIT_OFF_PATH", (one() - c(path)) * c(bit))?;
    global(
        spec,
        "POSITION",
        c(path) * (c(pos) - (one() - c(path_start)) * prev(pos) - c(bit) * c(pow2)),
    )?;
    global(
        spec,
        "COMBINATION",
        c(acc)
            - c(leaf) * ((one() - c(spot_start)) * prev(acc) * Expr::coin(vortex.alpha) + c(msg))
            - c(path) * prev(acc),
    )?;

    spec.register_query(
        spec.fresh_name(&format!("{name}_ROOT_LOOKUP")),
        round,
        Query::Inclusion(Inclusion {
            included: vec![matrix_id, out],
            including: vec![matrix_table, roots],
            filter: Some(block_end),
        }),
    )?;
    spec.register_query(
        spec.fresh_name(&format!("{name}_SPOT_LOOKUP")),
        round,
        Query::Inclusion(Inclusion {
            included: vec![spot_id, pos],
            including: vec![spot_table, spot_values],
            filter: Some(block_end),
        }),
    )?;
    spec.register_query(
        spec.fresh_name(&format!("{name}_SYMBOL_LOOKUP")),
        round + 1,
        Query::Inclusion(Inclusion {
            included: vec![spot_id, acc],
            including: vec![spot_table, symbols],
            filter: Some(spot_end),
        }),
    )?;

    let claim = spec.register_query(
        spec.fresh_name(&format!("{name}_CLAIM")),
        vortex.eval_round + 1,
        Query::UnivariateEval(UnivariateEval {
            columns: vec![vortex.u_alpha],
            point: vortex.point.clone(),
        }),
    )?;

    Ok(SelfRecursionCtx {
        name: name.to_owned(),
        vortex: vortex.clone(),
        rows,
        columns: TraceColumns {
            key,
            msg,
            sib,
            bit,
            pos,
            acc,
            out,
            states,
        },
        claim,
    })
}

impl SelfRecursionCtx {
    pub(crate) fn assign_trace(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let vortex = &self.vortex;
        let spots = rt.integer_coin(vortex.spots)?.to_vec();
        let alpha = rt.field_coin(vortex.alpha)?;
        let opened = rt.column(vortex.opened)?.to_vec();
        let siblings = rt.slot_digests(vortex.paths)?.to_vec();
        let total = vortex.num_rows();
        let matrices = vortex.matrices.len();
        let widths: Vec<usize> = vortex.matrices.iter().map(|matrix| matrix.num_rows()).collect();

        let mut trace = Trace::with_capacity(self.rows);
        let mut state = FieldElement::ZERO;
        let mut acc = FieldElement::ZERO;
        let mut position = FieldElement::ZERO;
        let mut symbol = 0usize;
        for row in layout(vortex) {
            match row.kind {
                RowKind::Leaf {
                    block_start,
                    spot_start,
                } => {
                    if block_start {
                        state = FieldElement::ZERO;
                        symbol = widths[..row.matrix].iter().sum();
                    }
                    let value = opened[row.spot * total + symbol];
                    symbol += 1;
                    acc = if spot_start { value } else { acc * alpha + value };
                    state = trace.push(state, value, FieldElement::ZERO, false, FieldElement::ZERO, acc);
                }
                RowKind::Path { level, first, .. } => {
                    let digest = siblings[(row.spot * matrices + row.matrix) * vortex.depth + level];
                    let sibling = digest.to_field().ok_or_else(|| {
                        AssignmentError::action("self-recursion", format!("sibling digest of `{}` is not a field element", vortex.name))
                    })?;
                    let bit = (spots[row.spot] >> level) & 1 == 1;
                    if first {
                        position = FieldElement::ZERO;
                    }
                    if bit {
                        position += FieldElement::from(1u64 << level);
                    }
                    let (key, msg) = if bit { (sibling, state) } else { (state, sibling) };
                    state = trace.push(key, msg, sibling, bit, position, acc);
                }
                RowKind::Padding => {
                    trace.push(
                        FieldElement::ZERO,
                        FieldElement::ZERO,
                        FieldElement::ZERO,
                        false,
                        FieldElement::ZERO,
                        FieldElement::ZERO,
                    );
                }
            }
        }
        debug_assert_eq!(trace.len(), self.rows);

        let columns = &self.columns;
        rt.assign_derived(columns.key, trace.key)?;
        rt.assign_derived(columns.msg, trace.msg)?;
        rt.assign_derived(columns.sib, trace.sib)?;
        rt.assign_derived(columns.bit, trace.bit)?;
        rt.assign_derived(columns.pos, trace.pos)?;
        rt.assign_derived(columns.acc, trace.acc)?;
        rt.assign_derived(columns.out, trace.out)?;
        for (column, values) in columns.states.iter().zip(trace.states) {
            rt.assign_derived(*column, values)?;
        }
        Ok(())
    }

    pub(crate) fn check_claim(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let alpha = rt.read_field_coin(&self.name, self.vortex.alpha)?;
        let expected = self.vortex.combined_claim(rt, alpha)?;
        if rt.read_param(&self.name, self.claim, 0)? == expected {
            Ok(())
        } else {
            Err(VerificationError::new(self.name.clone(), VerificationFailure::CombinedClaim))
        }
    }
}
