//! Log-derivative lookup argument for inclusion queries.
//!
//! Row tuples are folded with a coin `gamma` into `v = sum_k gamma^k col_k`.
//! With a second coin `alpha` the prover shows
//!
//! ```text
//! sum_i filter[i] / (alpha + v_in[i]) = sum_j M[j] / (alpha + v_table[j])
//! ```
//!
//! where `M` counts how often each table row is looked up. Both sides are
//! running-sum columns whose closing values the verifier compares.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::{CompileError, CompilerPass};
use crate::field::{batch_inverse, FieldElement};
use crate::iop::{
    CoinId, CoinKind, ColumnId, ColumnKind, ColumnOrigin, DefinitionError, Expr, GlobalConstraint, Inclusion,
    LocalConstraint, LocalOpening, Query, QueryFailure, QueryId, Specification,
};
use crate::prover::{AssignmentError, ProverRuntime};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupCtx {
    pub query: String,
    pub gamma: CoinId,
    pub alpha: CoinId,
    pub included: Vec<ColumnId>,
    pub including: Vec<ColumnId>,
    pub filter: Option<ColumnId>,
    pub multiplicities: ColumnId,
    pub sum_included: ColumnId,
    pub sum_table: ColumnId,
    pub closing_included: QueryId,
    pub closing_table: QueryId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupLowering;

impl CompilerPass for LookupLowering {
    fn name(&self) -> &'static str {
        "lookup"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "lookup"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, String, usize, Inclusion)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::Inclusion(q) => Some((id, info.name.clone(), info.round, q.clone())),
                _ => None,
            })
            .collect();
        let count = pending.len();
        for (id, name, round, inclusion) in pending {
            lower(&mut spec, &name, round, inclusion)
                .map_err(|error| CompileError::on_query(self.name(), &name, error))?;
            spec.mark_compiled(id, self.name());
        }
        debug!(queries = count, "inclusions lowered");
        Ok(spec)
    }
}

/// `sum_k gamma^k col_k` as an expression.
fn fold(columns: &[ColumnId], gamma: CoinId) -> Expr {
    let mut power = Expr::constant(1);
    let mut terms = Vec::with_capacity(columns.len());
    for &column in columns {
        terms.push(power.clone() * Expr::column(column));
        power = power * Expr::coin(gamma);
    }
    Expr::sum(terms)
}

fn lower(spec: &mut Specification, name: &str, round: usize, inclusion: Inclusion) -> Result<(), DefinitionError> {
    let next = round + 1;
    let included_size = spec.columns().info(inclusion.included[0]).size;
    let table_size = spec.columns().info(inclusion.including[0]).size;

    let multiplicities = spec.register_column(
        spec.fresh_name(&format!("{name}_M")),
        table_size,
        round,
        ColumnKind::Committed,
        ColumnOrigin::Derived,
    )?;
    let gamma = spec.register_coin(spec.fresh_name(&format!("{name}_GAMMA")), next, CoinKind::Field)?;
    let alpha = spec.register_coin(spec.fresh_name(&format!("{name}_ALPHA")), next, CoinKind::Field)?;

    let included_num = inclusion.filter.map_or(Expr::constant(1), Expr::column);
    let included_den = Expr::coin(alpha) + fold(&inclusion.included, gamma);
    let table_num = Expr::column(multiplicities);
    let table_den = Expr::coin(alpha) + fold(&inclusion.including, gamma);

    let mut sides = Vec::with_capacity(2);
    for (tag, size, num, den) in [
        ("S_IN", included_size, included_num, included_den),
        ("S_T", table_size, table_num, table_den),
    ] {
        let sum = spec.register_column(
            spec.fresh_name(&format!("{name}_{tag}")),
            size,
            next,
            ColumnKind::Committed,
            ColumnOrigin::Derived,
        )?;
        spec.register_query(
            spec.fresh_name(&format!("{name}_{tag}_STEP")),
            next,
            Query::Global(GlobalConstraint {
                expr: (Expr::column(sum) - Expr::shifted(sum, -1)) * den.clone() - num.clone(),
                domain_size: size,
                cyclic: false,
            }),
        )?;
        spec.register_query(
            spec.fresh_name(&format!("{name}_{tag}_START")),
            next,
            Query::Local(LocalConstraint {
                expr: Expr::column(sum) * den - num,
                domain_size: size,
            }),
        )?;
        let closing = spec.register_query(
            spec.fresh_name(&format!("{name}_{tag}_END")),
            next,
            Query::LocalOpening(LocalOpening {
                column: sum,
                position: size - 1,
            }),
        )?;
        sides.push((sum, closing));
    }
    let ctx = Arc::new(LookupCtx {
        query: name.to_owned(),
        gamma,
        alpha,
        included: inclusion.included,
        including: inclusion.including,
        filter: inclusion.filter,
        multiplicities,
        sum_included: sides[0].0,
        sum_table: sides[1].0,
        closing_included: sides[0].1,
        closing_table: sides[1].1,
    });
    spec.push_prover_action(round, ProverAction::LookupMultiplicities(ctx.clone()));
    spec.push_prover_action(next, ProverAction::LookupSums(ctx.clone()));
    spec.push_verifier_action(next, VerifierAction::LookupSum(ctx));
    Ok(())
}

fn row_tuples(rt: &ProverRuntime<'_>, columns: &[ColumnId]) -> Result<Vec<Vec<FieldElement>>, AssignmentError> {
    let values = columns
        .iter()
        .map(|&column| rt.column(column))
        .collect::<Result<Vec<_>, _>>()?;
    let rows = values.first().map_or(0, |column| column.len());
    Ok((0..rows)
        .map(|row| values.iter().map(|column| column[row]).collect())
        .collect())
}

fn folded(rt: &ProverRuntime<'_>, columns: &[ColumnId], gamma: FieldElement) -> Result<Vec<FieldElement>, AssignmentError> {
    Ok(row_tuples(rt, columns)?
        .into_iter()
        .map(|tuple| {
            let mut power = FieldElement::ONE;
            let mut acc = FieldElement::ZERO;
            for value in tuple {
                acc += power * value;
                power *= gamma;
            }
            acc
        })
        .collect())
}

fn running_sum(
    query: &str,
    nums: &[FieldElement],
    folded: &[FieldElement],
    alpha: FieldElement,
) -> Result<Vec<FieldElement>, AssignmentError> {
    let dens: Vec<FieldElement> = folded.iter().map(|value| alpha + *value).collect();
    let inverses = batch_inverse(&dens).ok_or_else(|| {
        AssignmentError::action("lookup sums", format!("`{query}`: a row cancels the challenge"))
    })?;
    let mut acc = FieldElement::ZERO;
    Ok(nums
        .iter()
        .zip(inverses)
        .map(|(num, inverse)| {
            acc += *num * inverse;
            acc
        })
        .collect())
}

impl LookupCtx {
    fn included_weights(&self, rt: &ProverRuntime<'_>, rows: usize) -> Result<Vec<FieldElement>, AssignmentError> {
        match self.filter {
            Some(filter) => Ok(rt.column(filter)?.to_vec()),
            None => Ok(vec![FieldElement::ONE; rows]),
        }
    }

    /// Counts, per table row, the (filter-weighted) lookups hitting it.
    /// Repeated table rows collect on their first occurrence.
    pub(crate) fn assign_multiplicities(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let table = row_tuples(rt, &self.including)?;
        let lookups = row_tuples(rt, &self.included)?;
        let weights = self.included_weights(rt, lookups.len())?;
        let mut first: BTreeMap<&[FieldElement], usize> = BTreeMap::new();
        for (index, tuple) in table.iter().enumerate() {
            first.entry(tuple.as_slice()).or_insert(index);
        }
        let mut counts = vec![FieldElement::ZERO; table.len()];
        for (row, (tuple, weight)) in lookups.iter().zip(&weights).enumerate() {
            if weight.is_zero() {
                continue;
            }
            match first.get(tuple.as_slice()) {
                Some(&index) => counts[index] += *weight,
                None if rt.checks_witness() => {
                    return Err(AssignmentError::QueryViolated {
                        query: self.query.clone(),
                        failure: QueryFailure::MissingTuple { row },
                    })
                }
                None => {}
            }
        }
        rt.assign_derived(self.multiplicities, counts)
    }

    pub(crate) fn assign_sums(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let gamma = rt.field_coin(self.gamma)?;
        let alpha = rt.field_coin(self.alpha)?;
        let included = folded(rt, &self.included, gamma)?;
        let weights = self.included_weights(rt, included.len())?;
        let sum_included = running_sum(&self.query, &weights, &included, alpha)?;
        let table = folded(rt, &self.including, gamma)?;
        let counts = rt.column(self.multiplicities)?.to_vec();
        let sum_table = running_sum(&self.query, &counts, &table, alpha)?;
        rt.assign_derived(self.sum_included, sum_included)?;
        rt.assign_derived(self.sum_table, sum_table)
    }

    pub(crate) fn check_sums(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let included = rt.read_param(&self.query, self.closing_included, 0)?;
        let table = rt.read_param(&self.query, self.closing_table, 0)?;
        if included == table {
            Ok(())
        } else {
            Err(VerificationError::new(self.query.clone(), VerificationFailure::LookupSum))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::Builder;

    #[test]
    fn multiplicities_live_in_the_lookup_round() {
        let spec = Builder::define(|b| {
            let table = b.precomputed("table", (0..8u64).map(FieldElement::from).collect())?;
            let x = b.commit("x", 4)?;
            b.inclusion("x-in-table", &[x], &[table])?;
            Ok(())
        })
        .unwrap();
        let lowered = LookupLowering.compile(spec).unwrap();
        let m = lowered.columns().get(lowered.column_id("x-in-table_M").unwrap()).unwrap();
        assert_eq!((m.size, m.round), (8, 0));
        let s_in = lowered.columns().get(lowered.column_id("x-in-table_S_IN").unwrap()).unwrap();
        assert_eq!((s_in.size, s_in.round), (4, 1));
        assert_eq!(lowered.prover_actions(0).len(), 1);
        assert_eq!(lowered.prover_actions(1).len(), 1);
    }
}
