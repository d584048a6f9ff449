//! Multi-point to single-point reduction.
//!
//! Claims `P_i(x_i) = y_i` are merged with powers of a coin `gamma` into
//!
//! ```text
//! H(X) = sum_i gamma^i X^(D - n_i + 1) (P_i(X) - y_i) / (X - x_i)
//! ```
//!
//! which is a polynomial exactly when every claim holds. `H` is committed,
//! a coin `z` is drawn, and the verifier checks the identity at `z` from one
//! evaluation of every column and of `H`.
//!
//! `D` is the size of `H` and `n_i` the size of the claimed column. The
//! shift makes a term overflow `D` coefficients as soon as `P_i` has `n_i`
//! or more, so a column committed inside a wider matrix cannot carry a
//! polynomial of higher degree than its own size allows.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::{CompileError, CompilerPass};
use crate::fft;
use crate::field::polynomial::Polynomial;
use crate::field::{batch_inverse, FieldElement};
use crate::iop::check::resolve_point;
use crate::iop::{
    CoinId, CoinKind, ColumnId, ColumnKind, ColumnOrigin, DefinitionError, EvalPoint, Query, QueryId,
    Specification, UnivariateEval,
};
use crate::prover::{AssignmentError, ProverRuntime};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

/// Result `index` of `query`, a claim about `column` at `point`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub query: QueryId,
    pub index: usize,
    pub column: ColumnId,
    pub point: EvalPoint,
    /// Power of `X` multiplying the claim's quotient.
    pub shift: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MptsCtx {
    pub name: String,
    pub claims: Vec<Claim>,
    pub gamma: CoinId,
    pub quotient: ColumnId,
    pub z: CoinId,
    /// Evaluation of every claimed column, then the quotient, at `z`.
    pub final_eval: QueryId,
    pub final_columns: Vec<ColumnId>,
    /// Coefficient count `D` of the quotient.
    pub degree_bound: usize,
}

/// Largest degree bound under which each column's claims are checked.
pub(crate) fn degree_bounds(spec: &Specification) -> BTreeMap<ColumnId, usize> {
    let mut bounds = BTreeMap::new();
    for action in (0..spec.num_rounds()).flat_map(|round| spec.verifier_actions(round)) {
        if let VerifierAction::MptsCheck(ctx) = action {
            for claim in &ctx.claims {
                let bound = bounds.entry(claim.column).or_insert(0);
                *bound = ctx.degree_bound.max(*bound);
            }
        }
    }
    bounds
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MultiPointReduction;

impl CompilerPass for MultiPointReduction {
    fn name(&self) -> &'static str {
        "mpts"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "mpts"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, usize, UnivariateEval)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::UnivariateEval(q) => Some((id, info.round, q.clone())),
                _ => None,
            })
            .collect();
        if pending.is_empty() {
            return Ok(spec);
        }
        let count = pending.len();
        let name = spec.fresh_name("MPTS");
        lower(&mut spec, &name, &pending).map_err(|error| CompileError::on_query(self.name(), &name, error))?;
        for (id, _, _) in &pending {
            spec.mark_compiled(*id, self.name());
        }
        debug!(queries = count, "evaluation claims merged");
        Ok(spec)
    }
}

fn lower(spec: &mut Specification, name: &str, pending: &[(QueryId, usize, UnivariateEval)]) -> Result<(), DefinitionError> {
    let last_round = pending.iter().map(|(_, round, _)| *round).max().unwrap_or(0);
    // Vortex sizes its matrices after the widest committed column, so `H`
    // must be at least that wide.
    let degree_bound = pending
        .iter()
        .flat_map(|(_, _, eval)| eval.columns.iter().map(|column| spec.columns().info(*column).size))
        .chain(
            spec.columns()
                .iter()
                .filter(|(_, info)| info.kind == ColumnKind::Committed)
                .map(|(_, info)| info.size),
        )
        .max()
        .unwrap_or(1);
    let mut claims = Vec::new();
    let mut final_columns: Vec<ColumnId> = Vec::new();
    for (query, _, eval) in pending {
        for (index, &column) in eval.columns.iter().enumerate() {
            claims.push(Claim {
                query: *query,
                index,
                column,
                point: eval.point.clone(),
                shift: degree_bound - spec.columns().info(column).size + 1,
            });
            if !final_columns.contains(&column) {
                final_columns.push(column);
            }
        }
    }
    let gamma = spec.register_coin(spec.fresh_name(&format!("{name}_GAMMA")), last_round + 1, CoinKind::Field)?;
    let quotient = spec.register_column(
        spec.fresh_name(&format!("{name}_H")),
        degree_bound,
        last_round + 1,
        ColumnKind::Committed,
        ColumnOrigin::Derived,
    )?;
    let z = spec.register_coin(spec.fresh_name(&format!("{name}_Z")), last_round + 2, CoinKind::Field)?;
    final_columns.push(quotient);
    let final_eval = spec.register_query(
        spec.fresh_name(&format!("{name}_EVAL")),
        last_round + 2,
        Query::UnivariateEval(UnivariateEval {
            columns: final_columns.clone(),
            point: EvalPoint::Coin(z),
        }),
    )?;
    let ctx = Arc::new(MptsCtx {
        name: name.to_owned(),
        claims,
        gamma,
        quotient,
        z,
        final_eval,
        final_columns,
        degree_bound,
    });
    spec.push_prover_action(last_round + 1, ProverAction::MptsQuotient(ctx.clone()));
    spec.push_verifier_action(last_round + 2, VerifierAction::MptsCheck(ctx));
    Ok(())
}

impl MptsCtx {
    pub(crate) fn assign_quotient(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let spec = rt.spec();
        let size = self.degree_bound;
        let gamma = rt.field_coin(self.gamma)?;
        let mut coefficients: BTreeMap<ColumnId, Vec<FieldElement>> = BTreeMap::new();
        let mut acc = vec![FieldElement::ZERO; size];
        let mut weight = FieldElement::ONE;
        for claim in &self.claims {
            if !coefficients.contains_key(&claim.column) {
                coefficients.insert(claim.column, fft::interpolate(rt.column(claim.column)?)?);
            }
            let point = resolve_point(spec, &claim.point, &*rt).map_err(|failure| AssignmentError::QueryViolated {
                query: self.name.clone(),
                failure,
            })?;
            let polynomial = Polynomial::new(coefficients[&claim.column].clone());
            let (quotient, _) = polynomial.divide_by_linear(point);
            // An honest quotient has at most `n_i - 1` coefficients and fits.
            for (slot, coeff) in acc.iter_mut().skip(claim.shift).zip(&quotient.coefficients) {
                *slot += weight * *coeff;
            }
            weight *= gamma;
        }
        rt.assign_derived(self.quotient, fft::evaluate(&acc, size)?)
    }

    pub(crate) fn check(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let spec = rt.spec();
        let gamma = rt.read_field_coin(&self.name, self.gamma)?;
        let z = rt.read_field_coin(&self.name, self.z)?;
        let mut points = Vec::with_capacity(self.claims.len());
        for claim in &self.claims {
            let point = resolve_point(spec, &claim.point, rt).map_err(|failure| VerificationError::new(self.name.clone(), failure))?;
            points.push(point);
        }
        let differences: Vec<FieldElement> = points.iter().map(|point| z - *point).collect();
        let inverses = batch_inverse(&differences)
            .ok_or_else(|| VerificationError::new(self.name.clone(), VerificationFailure::DegeneratePoint))?;

        let at_z = |column: ColumnId| -> Result<FieldElement, VerificationError> {
            let index = self
                .final_columns
                .iter()
                .position(|c| *c == column)
                .ok_or_else(|| VerificationError::malformed(self.name.clone(), "claim column is not evaluated"))?;
            rt.read_param(&self.name, self.final_eval, index)
        };
        let mut combined = FieldElement::ZERO;
        let mut weight = FieldElement::ONE;
        for (claim, inverse) in self.claims.iter().zip(inverses) {
            let claimed = rt.read_param(&self.name, claim.query, claim.index)?;
            combined += weight * z.pow(claim.shift as u64) * (at_z(claim.column)? - claimed) * inverse;
            weight *= gamma;
        }
        if combined == at_z(self.quotient)? {
            Ok(())
        } else {
            Err(VerificationError::new(self.name.clone(), VerificationFailure::MultiPoint))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Pipeline;
    use crate::field::polynomial::lagrange_evaluate;
    use crate::iop::Builder;
    use crate::params::{BuiltinProfile, CompilerParamsBuilder};
    use crate::proof::Proof;
    use crate::prover::{ProverOptions, RoundAssignment, Witness, WitnessSource};
    use crate::verifier::verify;

    #[test]
    fn claims_collapse_into_one_evaluation() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 8)?;
            let y = b.commit("y", 16)?;
            b.univariate("x-at-3", &[x], EvalPoint::Constant(FieldElement::from(3u64)))?;
            b.univariate("both-at-5", &[x, y], EvalPoint::Constant(FieldElement::from(5u64)))?;
            Ok(())
        })
        .unwrap();
        let lowered = MultiPointReduction.compile(spec).unwrap();
        let h = lowered.columns().get(lowered.column_id("MPTS_H").unwrap()).unwrap();
        assert_eq!((h.size, h.round), (16, 1));
        let pending = lowered.pending_queries();
        assert_eq!(pending.len(), 1);
        match &lowered.queries().get(pending[0]).unwrap().query {
            Query::UnivariateEval(q) => {
                assert_eq!(q.columns.len(), 3);
                assert_eq!(q.point, EvalPoint::Coin(lowered.coin_id("MPTS_Z").unwrap()));
            }
            other => panic!("unexpected query {other:?}"),
        }
    }

    #[test]
    fn shorter_columns_are_shifted_further() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 8)?;
            let y = b.commit("y", 16)?;
            b.commit("wide", 32)?;
            b.univariate("both-at-5", &[x, y], EvalPoint::Constant(FieldElement::from(5u64)))?;
            Ok(())
        })
        .unwrap();
        let lowered = MultiPointReduction.compile(spec).unwrap();
        let ctx = lowered
            .verifier_actions(2)
            .iter()
            .find_map(|action| match action {
                VerifierAction::MptsCheck(ctx) => Some(Arc::clone(ctx)),
                _ => None,
            })
            .unwrap();
        // The unclaimed 32-row column still sets the bound.
        assert_eq!(ctx.degree_bound, 32);
        let shifts: Vec<usize> = ctx.claims.iter().map(|claim| claim.shift).collect();
        assert_eq!(shifts, vec![25, 17]);
        let bounds = degree_bounds(&lowered);
        assert_eq!(bounds.get(&lowered.column_id("x").unwrap()), Some(&32));
        assert_eq!(bounds.get(&lowered.column_id("wide").unwrap()), None);
    }

    /// `a` has 4 rows inside an 8-wide matrix and is claimed at 3.
    fn short_claim(rows: usize) -> Specification {
        let params = CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST).build().unwrap();
        let spec = Builder::define(|b| {
            let a = b.commit("a", rows)?;
            b.commit("b", 8)?;
            b.univariate("a-at-3", &[a], EvalPoint::Constant(FieldElement::from(3u64)))?;
            Ok(())
        })
        .unwrap();
        Pipeline::commitment(params).compile(&spec).unwrap()
    }

    /// Runs the actions of `target` over the 8-row `a` of `wide`, so the
    /// matrix row of `a` carries whatever polynomial `values` interpolates.
    fn prove_over_wide_row(target: &Specification, wide: &Specification, values: Vec<FieldElement>) -> Proof {
        let options = ProverOptions {
            check_witness: false,
            ..ProverOptions::default()
        };
        let mut rt = ProverRuntime::new(wide, &options, false);
        rt.reseed_for(target);
        let b = (0..8u64).map(|v| FieldElement::from(v * v)).collect();
        let mut witness = Witness::new().with("a", values).with("b", b);
        for round in 0..target.num_rounds() {
            rt.begin_round(round).unwrap();
            witness.assign_round(round, &mut RoundAssignment::new(&mut rt)).unwrap();
            for action in target.prover_actions(round) {
                action.run(&mut rt).unwrap();
            }
            rt.close_round().unwrap();
        }
        let (mut proof, _) = rt.finish().unwrap();
        proof.spec_digest = crate::merkle::Digest(target.fingerprint());
        proof
    }

    #[test]
    fn short_columns_cannot_carry_a_longer_polynomial() {
        let target = short_claim(4);
        let wide = short_claim(8);
        let honest: Vec<FieldElement> = [5u64, 1, 4, 2].into_iter().map(FieldElement::from).collect();
        let extended = fft::extend(&honest, 8).unwrap();

        // A polynomial of fewer than 4 coefficients goes through.
        verify(&target, &prove_over_wide_row(&target, &wide, extended.clone())).unwrap();

        // P = Q + (X^4 - 1) agrees with `a` on its 4 rows but not at 3.
        let forged: Vec<FieldElement> = extended
            .iter()
            .enumerate()
            .map(|(row, value)| if row % 2 == 1 { *value - FieldElement::from(2u64) } else { *value })
            .collect();
        let three = FieldElement::from(3u64);
        assert_ne!(lagrange_evaluate(&forged, three), lagrange_evaluate(&honest, three));
        let error = verify(&target, &prove_over_wide_row(&target, &wide, forged)).unwrap_err();
        assert_eq!(error.query, "MPTS");
        assert_eq!(error.reason, VerificationFailure::MultiPoint);
    }
}
