//! Inner products as running sums.
//!
//! For each `b_k` the prover commits `S_k[i] = sum_{j <= i} a[j] b_k[j]`;
//! the last entry is opened and must equal the claimed `y_k`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::{CompileError, CompilerPass};
use crate::field::FieldElement;
use crate::iop::{
    ColumnId, ColumnKind, ColumnOrigin, DefinitionError, Expr, GlobalConstraint, InnerProduct, LocalConstraint,
    LocalOpening, Query, QueryId, Specification,
};
use crate::prover::{AssignmentError, ProverRuntime};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningSum {
    pub b: ColumnId,
    pub sum: ColumnId,
    pub closing: QueryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerProductCtx {
    pub query: String,
    /// The compiled query; its results are the claims.
    pub claims: QueryId,
    pub a: ColumnId,
    pub sums: Vec<RunningSum>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InnerProductLowering;

impl CompilerPass for InnerProductLowering {
    fn name(&self) -> &'static str {
        "inner-product"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "inner-product"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, String, usize, InnerProduct)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::InnerProduct(q) => Some((id, info.name.clone(), info.round, q.clone())),
                _ => None,
            })
            .collect();
        let count = pending.len();
        for (id, name, round, query) in pending {
            lower(&mut spec, id, &name, round, query)
                .map_err(|error| CompileError::on_query(self.name(), &name, error))?;
            spec.mark_compiled(id, self.name());
        }
        debug!(queries = count, "inner products lowered");
        Ok(spec)
    }
}

fn lower(
    spec: &mut Specification,
    id: QueryId,
    name: &str,
    round: usize,
    query: InnerProduct,
) -> Result<(), DefinitionError> {
    let size = spec.columns().info(query.a).size;
    let mut sums = Vec::with_capacity(query.bs.len());
    for (index, &b) in query.bs.iter().enumerate() {
        let sum = spec.register_column(
            spec.fresh_name(&format!("{name}_SUM_{index}")),
            size,
            round,
            ColumnKind::Committed,
            ColumnOrigin::Derived,
        )?;
        let product = Expr::column(query.a) * Expr::column(b);
        spec.register_query(
            spec.fresh_name(&format!("{name}_SUM_{index}_STEP")),
            round,
            Query::Global(GlobalConstraint {
                expr: Expr::column(sum) - Expr::shifted(sum, -1) - product.clone(),
                domain_size: size,
                cyclic: false,
            }),
        )?;
        spec.register_query(
            spec.fresh_name(&format!("{name}_SUM_{index}_START")),
            round,
            Query::Local(LocalConstraint {
                expr: Expr::column(sum) - product,
                domain_size: size,
            }),
        )?;
        let closing = spec.register_query(
            spec.fresh_name(&format!("{name}_SUM_{index}_END")),
            round,
            Query::LocalOpening(LocalOpening {
                column: sum,
                position: size - 1,
            }),
        )?;
        sums.push(RunningSum { b, sum, closing });
    }
    let ctx = Arc::new(InnerProductCtx {
        query: name.to_owned(),
        claims: id,
        a: query.a,
        sums,
    });
    spec.push_prover_action(round, ProverAction::InnerProductSums(ctx.clone()));
    spec.push_verifier_action(round, VerifierAction::InnerProductResult(ctx));
    Ok(())
}

impl InnerProductCtx {
    pub(crate) fn assign_sums(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let a = rt.column(self.a)?.to_vec();
        for running in &self.sums {
            let mut acc = FieldElement::ZERO;
            let sums: Vec<FieldElement> = a
                .iter()
                .zip(rt.column(running.b)?)
                .map(|(x, y)| {
                    acc += *x * *y;
                    acc
                })
                .collect();
            rt.assign_derived(running.sum, sums)?;
        }
        Ok(())
    }

    pub(crate) fn check_results(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        for (index, running) in self.sums.iter().enumerate() {
            let claimed = rt.read_param(&self.query, self.claims, index)?;
            let closing = rt.read_param(&self.query, running.closing, 0)?;
            if claimed != closing {
                return Err(VerificationError::new(
                    self.query.clone(),
                    VerificationFailure::InnerProduct { index },
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::Builder;

    #[test]
    fn one_running_sum_per_right_operand() {
        let spec = Builder::define(|b| {
            let a = b.commit("a", 8)?;
            let x = b.commit("x", 8)?;
            let y = b.commit("y", 8)?;
            b.inner_product("ip", a, &[x, y])?;
            Ok(())
        })
        .unwrap();
        let lowered = InnerProductLowering.compile(spec).unwrap();
        for name in ["ip_SUM_0", "ip_SUM_1"] {
            let info = lowered.columns().get(lowered.column_id(name).unwrap()).unwrap();
            assert_eq!((info.size, info.round, info.kind), (8, 0, ColumnKind::Committed));
        }
        assert_eq!(lowered.verifier_actions(0).len(), 1);
        assert_eq!(lowered.pending_queries().len(), 6);
    }
}
