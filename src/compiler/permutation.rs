//! Grand-product argument for permutation queries.
//!
//! For a coin `beta` drawn after the permuted columns are fixed, every
//! fragment `f` of side A gets a running product `Z[i] = Z[i-1] (f[i] + beta)`
//! and every fragment of side B the running inverse product
//! `Z[i] = Z[i-1] / (f[i] + beta)`. Both are pinned by a boundary and a
//! transition constraint, and the verifier checks that the product of all
//! closing values is one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::{CompileError, CompilerPass};
use crate::field::{batch_inverse, FieldElement};
use crate::iop::{
    CoinId, CoinKind, ColumnId, ColumnKind, ColumnOrigin, DefinitionError, Expr, GlobalConstraint,
    LocalConstraint, LocalOpening, Query, QueryId, Specification,
};
use crate::prover::{AssignmentError, ProverRuntime};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

/// Accumulator of one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColumn {
    pub fragment: ColumnId,
    pub product: ColumnId,
    pub closing: QueryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationCtx {
    pub query: String,
    pub beta: CoinId,
    pub a: Vec<ProductColumn>,
    pub b: Vec<ProductColumn>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PermutationLowering;

impl CompilerPass for PermutationLowering {
    fn name(&self) -> &'static str {
        "permutation"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "permutation"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, String, usize, Vec<ColumnId>, Vec<ColumnId>)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::Permutation(q) => Some((id, info.name.clone(), info.round, q.a.clone(), q.b.clone())),
                _ => None,
            })
            .collect();
        let count = pending.len();
        for (id, name, round, a, b) in pending {
            lower(&mut spec, &name, round, &a, &b).map_err(|error| CompileError::on_query(self.name(), &name, error))?;
            spec.mark_compiled(id, self.name());
        }
        debug!(queries = count, "permutations lowered");
        Ok(spec)
    }
}

fn lower(
    spec: &mut Specification,
    name: &str,
    round: usize,
    a: &[ColumnId],
    b: &[ColumnId],
) -> Result<(), DefinitionError> {
    let next = round + 1;
    let beta = spec.register_coin(spec.fresh_name(&format!("{name}_BETA")), next, CoinKind::Field)?;
    let side = |spec: &mut Specification, fragments: &[ColumnId], tag: &str, inverse: bool| {
        let mut out = Vec::with_capacity(fragments.len());
        for (index, &fragment) in fragments.iter().enumerate() {
            let size = spec.columns().info(fragment).size;
            let product = spec.register_column(
                spec.fresh_name(&format!("{name}_Z_{tag}_{index}")),
                size,
                next,
                ColumnKind::Committed,
                ColumnOrigin::Derived,
            )?;
            let shifted = Expr::column(fragment) + Expr::coin(beta);
            let (transition, boundary) = if inverse {
                (
                    Expr::column(product) * shifted.clone() - Expr::shifted(product, -1),
                    Expr::column(product) * shifted - Expr::constant(1),
                )
            } else {
                (
                    Expr::column(product) - Expr::shifted(product, -1) * shifted.clone(),
                    Expr::column(product) - shifted,
                )
            };
            spec.register_query(
                spec.fresh_name(&format!("{name}_Z_{tag}_{index}_STEP")),
                next,
                Query::Global(GlobalConstraint {
                    expr: transition,
                    domain_size: size,
                    cyclic: false,
                }),
            )?;
            spec.register_query(
                spec.fresh_name(&format!("{name}_Z_{tag}_{index}_START")),
                next,
                Query::Local(LocalConstraint {
                    expr: boundary,
                    domain_size: size,
                }),
            )?;
            let closing = spec.register_query(
                spec.fresh_name(&format!("{name}_Z_{tag}_{index}_END")),
                next,
                Query::LocalOpening(LocalOpening {
                    column: product,
                    position: size - 1,
                }),
            )?;
            out.push(ProductColumn {
                fragment,
                product,
                closing,
            });
        }
        Ok::<_, DefinitionError>(out)
    };
    let a = side(spec, a, "A", false)?;
    let b = side(spec, b, "B", true)?;
    let ctx = Arc::new(PermutationCtx {
        query: name.to_owned(),
        beta,
        a,
        b,
    });
    spec.push_prover_action(next, ProverAction::PermutationProducts(ctx.clone()));
    spec.push_verifier_action(next, VerifierAction::PermutationProduct(ctx));
    Ok(())
}

impl PermutationCtx {
    pub(crate) fn assign_products(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let beta = rt.field_coin(self.beta)?;
        for column in &self.a {
            let values = rt.column(column.fragment)?;
            let mut acc = FieldElement::ONE;
            let products: Vec<FieldElement> = values
                .iter()
                .map(|value| {
                    acc *= *value + beta;
                    acc
                })
                .collect();
            rt.assign_derived(column.product, products)?;
        }
        for column in &self.b {
            let shifted: Vec<FieldElement> = rt.column(column.fragment)?.iter().map(|value| *value + beta).collect();
            let inverses = batch_inverse(&shifted).ok_or_else(|| {
                AssignmentError::action(
                    "permutation products",
                    format!("`{}`: a value cancels the challenge", self.query),
                )
            })?;
            let mut acc = FieldElement::ONE;
            let products: Vec<FieldElement> = inverses
                .into_iter()
                .map(|inverse| {
                    acc *= inverse;
                    acc
                })
                .collect();
            rt.assign_derived(column.product, products)?;
        }
        Ok(())
    }

    pub(crate) fn check_products(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let mut product = FieldElement::ONE;
        for column in self.a.iter().chain(&self.b) {
            product *= rt.read_param(&self.query, column.closing, 0)?;
        }
        if product == FieldElement::ONE {
            Ok(())
        } else {
            Err(VerificationError::new(
                self.query.clone(),
                VerificationFailure::PermutationProduct,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::Builder;

    #[test]
    fn one_accumulator_per_fragment() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 4)?;
            let y = b.commit("y", 4)?;
            let z = b.commit("z", 8)?;
            b.permutation("shuffle", &[x, y], &[z])?;
            Ok(())
        })
        .unwrap();
        let lowered = PermutationLowering.compile(spec).unwrap();
        assert!(lowered.column_id("shuffle_Z_A_0").is_some());
        assert!(lowered.column_id("shuffle_Z_A_1").is_some());
        let z_b = lowered.column_id("shuffle_Z_B_0").unwrap();
        let info = lowered.columns().get(z_b).unwrap();
        assert_eq!((info.size, info.round), (8, 1));
        assert_eq!(lowered.coins().get(lowered.coin_id("shuffle_BETA").unwrap()).unwrap().round, 1);
        assert_eq!(lowered.verifier_actions(1).len(), 1);
        // A step, a start and an end query per fragment.
        assert_eq!(lowered.pending_queries().len(), 9);
    }
}
