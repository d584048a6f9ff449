//! Quotient argument for global constraints.
//!
//! Constraints of the same round and domain `H_n` are merged with powers of
//! a coin `mu`. Rows a non-cyclic constraint is exempt from are cancelled by
//! multiplying with `prod (X - w^k)` over those rows, so the merged
//! polynomial `P` vanishes on all of `H_n` and
//!
//! ```text
//! P(X) = (X^n - 1) * sum_k X^{kn} Q_k(X)
//! ```
//!
//! for quotient chunks `Q_k` of degree below `n`. The chunks are committed,
//! a coin `zeta` is drawn, and every column is evaluated at `w^s * zeta` for
//! each shift `s` it is read with.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::{ProverAction, VerifierAction};
use super::{CompileError, CompilerPass};
use crate::fft::{self, Radix2Domain, COSET_OFFSET};
use crate::field::{batch_inverse, FieldElement};
use crate::iop::check::exempt_rows;
use crate::iop::{
    rotate, CoinId, CoinKind, ColumnId, ColumnKind, ColumnOrigin, DefinitionError, EvalPoint, Expr,
    GlobalConstraint, Query, QueryFailure, QueryId, Specification, UnivariateEval,
};
use crate::prover::{AssignmentError, ProverRuntime};
use crate::utils::{next_power_of_two, par_map};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

/// One merged constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMember {
    pub query: String,
    pub expr: Expr,
    /// Rows the constraint is not required to hold on.
    pub exempt: Vec<usize>,
}

/// Evaluation of the columns read with one shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftedEval {
    pub shift: usize,
    pub query: QueryId,
    pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCtx {
    pub name: String,
    pub domain_size: usize,
    /// Size of the coset the merged polynomial is evaluated on.
    pub coset_size: usize,
    pub members: Vec<GlobalMember>,
    pub mu: CoinId,
    pub zeta: CoinId,
    pub quotients: Vec<ColumnId>,
    pub evals: Vec<ShiftedEval>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalLowering;

impl CompilerPass for GlobalLowering {
    fn name(&self) -> &'static str {
        "global"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "global"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let mut groups: BTreeMap<(usize, usize), Vec<(QueryId, String, GlobalConstraint)>> = BTreeMap::new();
        for (id, info) in spec.queries().pending() {
            if let Query::Global(q) = &info.query {
                groups
                    .entry((info.round, q.domain_size))
                    .or_default()
                    .push((id, info.name.clone(), q.clone()));
            }
        }
        let count = groups.len();
        for ((round, domain_size), members) in groups {
            let label = members.first().map(|(_, name, _)| name.clone()).unwrap_or_default();
            lower(&mut spec, round, domain_size, &members)
                .map_err(|error| CompileError::on_query(self.name(), &label, error))?;
            for (id, _, _) in &members {
                spec.mark_compiled(*id, self.name());
            }
        }
        debug!(groups = count, "global constraints lowered");
        Ok(spec)
    }
}

fn lower(
    spec: &mut Specification,
    round: usize,
    n: usize,
    constraints: &[(QueryId, String, GlobalConstraint)],
) -> Result<(), DefinitionError> {
    let name = spec.fresh_name(&format!("GLOBAL_R{round}_N{n}"));
    let mut members = Vec::with_capacity(constraints.len());
    let mut max_degree = 0usize;
    let mut refs: BTreeSet<(usize, ColumnId)> = BTreeSet::new();
    for (_, query, constraint) in constraints {
        let column_refs = constraint.expr.column_refs();
        let exempt = if constraint.cyclic {
            Vec::new()
        } else {
            let (head, tail) = exempt_rows(&column_refs, n);
            (0..head).chain(n - tail..n).collect::<BTreeSet<_>>().into_iter().collect()
        };
        let degree = constraint.expr.degree() * (n - 1) + exempt.len();
        max_degree = max_degree.max(degree);
        refs.extend(
            column_refs
                .into_iter()
                .map(|(column, shift)| (shift.rem_euclid(n as isize) as usize, column)),
        );
        members.push(GlobalMember {
            query: query.clone(),
            expr: constraint.expr.clone(),
            exempt,
        });
    }
    let coset_size = next_power_of_two(max_degree + 1).max(n);
    let chunks = coset_size / n;

    let mu = spec.register_coin(spec.fresh_name(&format!("{name}_MU")), round + 1, CoinKind::Field)?;
    let mut quotients = Vec::with_capacity(chunks);
    for chunk in 0..chunks {
        quotients.push(spec.register_column(
            spec.fresh_name(&format!("{name}_Q_{chunk}")),
            n,
            round + 1,
            ColumnKind::Committed,
            ColumnOrigin::Derived,
        )?);
    }
    let zeta = spec.register_coin(spec.fresh_name(&format!("{name}_ZETA")), round + 2, CoinKind::Field)?;

    let mut by_shift: BTreeMap<usize, Vec<ColumnId>> = BTreeMap::new();
    by_shift.entry(0).or_default().extend(quotients.iter().copied());
    for (shift, column) in refs {
        by_shift.entry(shift).or_default().push(column);
    }
    let root = FieldElement::root_of_unity(n.trailing_zeros() as usize).ok_or_else(|| {
        DefinitionError::InvalidSize {
            name: name.clone(),
            size: n,
        }
    })?;
    let mut evals = Vec::with_capacity(by_shift.len());
    for (shift, columns) in by_shift {
        let query = spec.register_query(
            spec.fresh_name(&format!("{name}_EVAL_S{shift}")),
            round + 2,
            Query::UnivariateEval(UnivariateEval {
                columns: columns.clone(),
                point: EvalPoint::ScaledCoin {
                    coin: zeta,
                    factor: root.pow(shift as u64),
                },
            }),
        )?;
        evals.push(ShiftedEval { shift, query, columns });
    }

    let ctx = Arc::new(GlobalCtx {
        name,
        domain_size: n,
        coset_size,
        members,
        mu,
        zeta,
        quotients,
        evals,
    });
    spec.push_prover_action(round + 1, ProverAction::GlobalQuotient(ctx.clone()));
    spec.push_verifier_action(round + 2, VerifierAction::GlobalIdentity(ctx));
    Ok(())
}

/// `prod_k (x - w^k)` over the exempt rows.
fn cancel_factor(exempt: &[usize], root: FieldElement, x: FieldElement) -> FieldElement {
    exempt.iter().map(|&row| x - root.pow(row as u64)).product()
}

impl GlobalCtx {
    fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|member| member.query.clone()).collect()
    }

    /// Evaluates the merged constraint on the coset, divides by the
    /// vanishing polynomial and splits the quotient into chunks.
    pub(crate) fn assign_quotient(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let n = self.domain_size;
        let m = self.coset_size;
        let stretch = m / n;
        let mu = rt.field_coin(self.mu)?;
        let small = Radix2Domain::new(n)?;
        let large = Radix2Domain::new(m)?;

        let mut columns: BTreeSet<ColumnId> = BTreeSet::new();
        for member in &self.members {
            columns.extend(member.expr.columns());
        }
        let columns: Vec<ColumnId> = columns.into_iter().collect();
        let values = columns
            .iter()
            .map(|&column| rt.column(column).map(<[FieldElement]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;
        let coset_values = par_map(rt.parallel(), 1, &values, |values| {
            let mut coeffs = values.clone();
            small.ifft(&mut coeffs)?;
            coeffs.resize(m, FieldElement::ZERO);
            large.coset_fft(&mut coeffs, COSET_OFFSET)?;
            Ok::<_, fft::FftError>(coeffs)
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
        let on_coset: BTreeMap<ColumnId, Vec<FieldElement>> = columns.into_iter().zip(coset_values).collect();

        let points: Vec<FieldElement> = (0..m).map(|j| COSET_OFFSET * large.element(j)).collect();
        let mut merged = vec![FieldElement::ZERO; m];
        let mut weight = FieldElement::ONE;
        for member in &self.members {
            let evaluated = member.expr.evaluate_vector::<AssignmentError>(
                m,
                &mut |column, shift| {
                    let values = on_coset.get(&column).ok_or_else(|| AssignmentError::MissingColumn {
                        name: rt.spec().columns().info(column).name.clone(),
                        round: rt.round(),
                    })?;
                    let steps = shift.rem_euclid(n as isize) as usize * stretch;
                    Ok(rotate(values, steps as isize))
                },
                &mut |coin| rt.field_coin(coin),
            )?;
            let root = small.generator();
            for ((acc, value), x) in merged.iter_mut().zip(evaluated).zip(&points) {
                *acc += weight * value * cancel_factor(&member.exempt, root, *x);
            }
            weight *= mu;
        }

        // Z_H(g w_m^j) = g^n w_{m/n}^j - 1, periodic in j with period m/n.
        let shift = COSET_OFFSET.pow(n as u64);
        let period = Radix2Domain::new(stretch)?;
        let denominators: Vec<FieldElement> =
            (0..stretch).map(|j| shift * period.element(j) - FieldElement::ONE).collect();
        let inverses = batch_inverse(&denominators)
            .ok_or_else(|| AssignmentError::action("global quotient", "vanishing polynomial is zero on the coset"))?;
        for (j, value) in merged.iter_mut().enumerate() {
            *value *= inverses[j % stretch];
        }
        large.coset_ifft(&mut merged, COSET_OFFSET)?;

        for (chunk, column) in merged.chunks(n).zip(&self.quotients) {
            rt.assign_derived(*column, fft::evaluate(chunk, n)?)?;
        }
        debug!(name = %self.name, chunks = self.quotients.len(), coset = m, "quotient assigned");
        Ok(())
    }

    pub(crate) fn check_identity(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let n = self.domain_size;
        let root = FieldElement::root_of_unity(n.trailing_zeros() as usize)
            .ok_or_else(|| VerificationError::malformed(self.name.clone(), "domain has no root of unity"))?;
        let mu = rt.read_field_coin(&self.name, self.mu)?;
        let zeta = rt.read_field_coin(&self.name, self.zeta)?;

        let value_at = |column: ColumnId, shift: usize| -> Result<FieldElement, VerificationError> {
            let eval = self
                .evals
                .iter()
                .find(|eval| eval.shift == shift)
                .and_then(|eval| eval.columns.iter().position(|c| *c == column).map(|index| (eval.query, index)));
            match eval {
                Some((query, index)) => rt.read_param(&self.name, query, index),
                None => Err(VerificationError::new(
                    self.name.clone(),
                    QueryFailure::MissingColumn(rt.spec().columns().info(column).name.clone()),
                )),
            }
        };

        let mut merged = FieldElement::ZERO;
        let mut weight = FieldElement::ONE;
        for member in &self.members {
            let value = member.expr.evaluate::<VerificationError>(
                &mut |column, shift| value_at(column, shift.rem_euclid(n as isize) as usize),
                &mut |coin| rt.read_field_coin(&member.query, coin),
            )?;
            merged += weight * value * cancel_factor(&member.exempt, root, zeta);
            weight *= mu;
        }

        let zeta_n = zeta.pow(n as u64);
        let mut quotient = FieldElement::ZERO;
        let mut power = FieldElement::ONE;
        for column in &self.quotients {
            quotient += power * value_at(*column, 0)?;
            power *= zeta_n;
        }
        if merged == (zeta_n - FieldElement::ONE) * quotient {
            Ok(())
        } else {
            Err(VerificationError::new(
                self.name.clone(),
                VerificationFailure::GlobalIdentity {
                    members: self.member_names(),
                },
            ))
        }
    }
}
