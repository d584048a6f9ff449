//! Plaintext semantics of every query.
//!
//! These checks read the full column values. The prover runs them in
//! fail-closed mode, the dummy compiler hands them to the verifier, and
//! tests use them as the ground truth for compiled pipelines.

use std::collections::BTreeSet;

use super::coin::CoinValue;
use super::expr::rotate;
use super::column::VerifierColumn;
use super::ids::{CoinId, ColumnId, QueryId, SlotId};
use super::query::{EvalPoint, Query, QueryParams};
use super::specification::Specification;
use crate::field::polynomial::lagrange_evaluate;
use crate::field::FieldElement;
use crate::merkle::Digest;

/// Read access to assigned values, implemented by both runtimes.
pub trait Assignment {
    fn column(&self, id: ColumnId) -> Option<&[FieldElement]>;
    fn coin(&self, id: CoinId) -> Option<&CoinValue>;
    fn params(&self, id: QueryId) -> Option<&QueryParams>;

    fn digests(&self, _slot: SlotId) -> Option<&[Digest]> {
        None
    }
}

/// Why a query does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryFailure {
    #[error("constraint does not vanish at row {row}")]
    GlobalRow { row: usize },
    #[error("boundary constraint evaluates to {value}")]
    LocalNonZero { value: FieldElement },
    #[error("the two sides are not permutations of each other")]
    NotAPermutation,
    #[error("row {row} of the included columns is missing from the table")]
    MissingTuple { row: usize },
    #[error("value {value} at row {row} is not below {bound}")]
    OutOfRange { row: usize, value: u64, bound: u64 },
    #[error("claimed result {index} is {claimed}, actual value is {actual}")]
    ResultMismatch {
        index: usize,
        claimed: FieldElement,
        actual: FieldElement,
    },
    #[error("claimed result has {got} values, expected {expected}")]
    ResultLength { expected: usize, got: usize },
    #[error("column `{0}` is not assigned")]
    MissingColumn(String),
    #[error("coin `{0}` is not sampled")]
    MissingCoin(String),
    #[error("coin `{0}` has the wrong kind for this use")]
    CoinKind(String),
    #[error("query result is not available")]
    MissingParams,
    #[error("query does not produce a result")]
    NoResult,
    #[error("column `{0}` cannot be interpolated")]
    Interpolation(String),
    #[error("digest slot `{0}` is not filled")]
    MissingDigests(String),
    #[error("digest in slot `{0}` is not a field encoding")]
    DigestEncoding(String),
    #[error("verifier column `{0}` has more entries than rows")]
    Overflow(String),
}

pub(crate) fn column_values<'a, A: Assignment + ?Sized>(
    spec: &Specification,
    assignment: &'a A,
    id: ColumnId,
) -> Result<&'a [FieldElement], QueryFailure> {
    assignment
        .column(id)
        .ok_or_else(|| QueryFailure::MissingColumn(spec.columns.info(id).name.clone()))
}

pub(crate) fn field_coin<A: Assignment + ?Sized>(
    spec: &Specification,
    assignment: &A,
    id: CoinId,
) -> Result<FieldElement, QueryFailure> {
    let name = || spec.coins.info(id).name.clone();
    assignment
        .coin(id)
        .ok_or_else(|| QueryFailure::MissingCoin(name()))?
        .as_field()
        .ok_or_else(|| QueryFailure::CoinKind(name()))
}

/// Resolves an evaluation point from sampled coins.
pub fn resolve_point<A: Assignment + ?Sized>(
    spec: &Specification,
    point: &EvalPoint,
    assignment: &A,
) -> Result<FieldElement, QueryFailure> {
    match point {
        EvalPoint::Constant(value) => Ok(*value),
        EvalPoint::Coin(coin) => field_coin(spec, assignment, *coin),
        EvalPoint::ScaledCoin { coin, factor } => Ok(*factor * field_coin(spec, assignment, *coin)?),
        EvalPoint::RootPower {
            coin,
            index,
            domain_size,
        } => {
            let name = || spec.coins.info(*coin).name.clone();
            let entries = assignment
                .coin(*coin)
                .ok_or_else(|| QueryFailure::MissingCoin(name()))?
                .as_integers()
                .ok_or_else(|| QueryFailure::CoinKind(name()))?;
            let exponent = *entries.get(*index).ok_or_else(|| QueryFailure::CoinKind(name()))?;
            let root = FieldElement::root_of_unity(domain_size.trailing_zeros() as usize)
                .ok_or_else(|| QueryFailure::CoinKind(name()))?;
            Ok(root.pow(exponent as u64))
        }
    }
}

/// Values of a verifier-defined column, zero padded to its size.
pub fn materialize_verifier_column<A: Assignment + ?Sized>(
    spec: &Specification,
    id: ColumnId,
    recipe: &VerifierColumn,
    assignment: &A,
) -> Result<Vec<FieldElement>, QueryFailure> {
    let info = spec.columns.info(id);
    let mut values = Vec::with_capacity(info.size);
    match recipe {
        VerifierColumn::IntegerCoin { coin } => {
            let name = || spec.coins.info(*coin).name.clone();
            let entries = assignment
                .coin(*coin)
                .ok_or_else(|| QueryFailure::MissingCoin(name()))?
                .as_integers()
                .ok_or_else(|| QueryFailure::CoinKind(name()))?;
            values.extend(entries.iter().map(|&entry| FieldElement::from(entry as u64)));
        }
        VerifierColumn::DigestSlots { slots } => {
            for slot in slots {
                let name = || {
                    spec.slot(*slot)
                        .map(|slot| slot.name.clone())
                        .unwrap_or_default()
                };
                let digests = assignment
                    .digests(*slot)
                    .ok_or_else(|| QueryFailure::MissingDigests(name()))?;
                for digest in digests {
                    values.push(digest.to_field().ok_or_else(|| QueryFailure::DigestEncoding(name()))?);
                }
            }
        }
        VerifierColumn::QueryResults { queries } => {
            for query in queries {
                let params = assignment.params(*query).ok_or(QueryFailure::MissingParams)?;
                values.push(params.values.first().copied().unwrap_or(FieldElement::ZERO));
            }
        }
    }
    if values.len() > info.size {
        return Err(QueryFailure::Overflow(info.name.clone()));
    }
    values.resize(info.size, FieldElement::ZERO);
    Ok(values)
}

/// Rows exempt from a non-cyclic constraint reading `refs`.
pub(crate) fn exempt_rows(refs: &BTreeSet<(ColumnId, isize)>, size: usize) -> (usize, usize) {
    let min_shift = refs.iter().map(|(_, shift)| *shift).min().unwrap_or(0).min(0);
    let max_shift = refs.iter().map(|(_, shift)| *shift).max().unwrap_or(0).max(0);
    let head = min_shift.unsigned_abs().min(size);
    let tail = (max_shift as usize).min(size);
    (head, tail)
}

/// Checks one query against `assignment`.
pub fn check_query<A: Assignment + ?Sized>(
    spec: &Specification,
    id: QueryId,
    assignment: &A,
) -> Result<(), QueryFailure> {
    let info = spec.queries.info(id);
    match &info.query {
        Query::Global(q) => {
            let values = q.expr.evaluate_vector::<QueryFailure>(
                q.domain_size,
                &mut |column, shift| Ok(rotate(column_values(spec, assignment, column)?, shift)),
                &mut |coin| field_coin(spec, assignment, coin),
            )?;
            let (head, tail) = if q.cyclic {
                (0, 0)
            } else {
                exempt_rows(&q.expr.column_refs(), q.domain_size)
            };
            let checked_end = q.domain_size.saturating_sub(tail);
            match values
                .iter()
                .enumerate()
                .take(checked_end)
                .skip(head)
                .find(|(_, value)| !value.is_zero())
            {
                Some((row, _)) => Err(QueryFailure::GlobalRow { row }),
                None => Ok(()),
            }
        }
        Query::Local(q) => {
            let value = q.expr.evaluate::<QueryFailure>(
                &mut |column, shift| {
                    let values = column_values(spec, assignment, column)?;
                    Ok(values[shift.rem_euclid(values.len() as isize) as usize])
                },
                &mut |coin| field_coin(spec, assignment, coin),
            )?;
            if value.is_zero() {
                Ok(())
            } else {
                Err(QueryFailure::LocalNonZero { value })
            }
        }
        Query::Permutation(q) => {
            let collect = |columns: &[ColumnId]| -> Result<Vec<u64>, QueryFailure> {
                let mut out = Vec::new();
                for &column in columns {
                    out.extend(column_values(spec, assignment, column)?.iter().map(|v| v.as_u64()));
                }
                out.sort_unstable();
                Ok(out)
            };
            if collect(&q.a)? == collect(&q.b)? {
                Ok(())
            } else {
                Err(QueryFailure::NotAPermutation)
            }
        }
        Query::Inclusion(q) => {
            let table = tuples(spec, assignment, &q.including)?;
            let lookups = tuples(spec, assignment, &q.included)?;
            let table: BTreeSet<Vec<u64>> = table.into_iter().collect();
            let filter = match q.filter {
                Some(filter) => Some(column_values(spec, assignment, filter)?),
                None => None,
            };
            for (row, tuple) in lookups.iter().enumerate() {
                let active = filter.map_or(true, |values| !values[row].is_zero());
                if active && !table.contains(tuple) {
                    return Err(QueryFailure::MissingTuple { row });
                }
            }
            Ok(())
        }
        Query::Range(q) => {
            let values = column_values(spec, assignment, q.column)?;
            match values.iter().enumerate().find(|(_, value)| value.as_u64() >= q.bound) {
                Some((row, value)) => Err(QueryFailure::OutOfRange {
                    row,
                    value: value.as_u64(),
                    bound: q.bound,
                }),
                None => Ok(()),
            }
        }
        Query::InnerProduct(_) | Query::UnivariateEval(_) | Query::LocalOpening(_) => {
            let claimed = assignment.params(id).ok_or(QueryFailure::MissingParams)?;
            let actual = compute_params(spec, id, assignment)?;
            if claimed.values.len() != actual.values.len() {
                return Err(QueryFailure::ResultLength {
                    expected: actual.values.len(),
                    got: claimed.values.len(),
                });
            }
            match claimed
                .values
                .iter()
                .zip(&actual.values)
                .enumerate()
                .find(|(_, (claimed, actual))| claimed != actual)
            {
                Some((index, (claimed, actual))) => Err(QueryFailure::ResultMismatch {
                    index,
                    claimed: *claimed,
                    actual: *actual,
                }),
                None => Ok(()),
            }
        }
    }
}

/// Row tuples of `columns` (all of equal size).
pub(crate) fn tuples<A: Assignment + ?Sized>(
    spec: &Specification,
    assignment: &A,
    columns: &[ColumnId],
) -> Result<Vec<Vec<u64>>, QueryFailure> {
    let values = columns
        .iter()
        .map(|&column| column_values(spec, assignment, column))
        .collect::<Result<Vec<_>, _>>()?;
    let rows = values.first().map_or(0, |column| column.len());
    Ok((0..rows)
        .map(|row| values.iter().map(|column| column[row].as_u64()).collect())
        .collect())
}

/// Computes the result a result query must carry.
pub fn compute_params<A: Assignment + ?Sized>(
    spec: &Specification,
    id: QueryId,
    assignment: &A,
) -> Result<QueryParams, QueryFailure> {
    let info = spec.queries.info(id);
    match &info.query {
        Query::InnerProduct(q) => {
            let a = column_values(spec, assignment, q.a)?;
            let values = q
                .bs
                .iter()
                .map(|&b| {
                    let b = column_values(spec, assignment, b)?;
                    Ok(a.iter().zip(b).map(|(x, y)| *x * *y).sum())
                })
                .collect::<Result<Vec<FieldElement>, QueryFailure>>()?;
            Ok(QueryParams::new(values))
        }
        Query::UnivariateEval(q) => {
            let point = resolve_point(spec, &q.point, assignment)?;
            let values = q
                .columns
                .iter()
                .map(|&column| {
                    let values = column_values(spec, assignment, column)?;
                    lagrange_evaluate(values, point)
                        .ok_or_else(|| QueryFailure::Interpolation(spec.columns.info(column).name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QueryParams::new(values))
        }
        Query::LocalOpening(q) => {
            let values = column_values(spec, assignment, q.column)?;
            Ok(QueryParams::new(vec![values[q.position]]))
        }
        _ => Err(QueryFailure::NoResult),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::iop::{Builder, Expr};

    #[derive(Default)]
    struct Plain {
        columns: BTreeMap<ColumnId, Vec<FieldElement>>,
        params: BTreeMap<QueryId, QueryParams>,
    }

    impl Assignment for Plain {
        fn column(&self, id: ColumnId) -> Option<&[FieldElement]> {
            self.columns.get(&id).map(Vec::as_slice)
        }

        fn coin(&self, _id: CoinId) -> Option<&CoinValue> {
            None
        }

        fn params(&self, id: QueryId) -> Option<&QueryParams> {
            self.params.get(&id)
        }
    }

    fn felts(values: &[u64]) -> Vec<FieldElement> {
        values.iter().copied().map(FieldElement::from).collect()
    }

    #[test]
    fn counter_fails_at_the_repeated_row() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 8)?;
            b.global("step", Expr::column(x) - Expr::shifted(x, -1) - Expr::constant(1))?;
            Ok(())
        })
        .unwrap();
        let x = spec.column_id("x").unwrap();
        let step = spec.query_id("step").unwrap();
        let mut plain = Plain::default();
        plain.columns.insert(x, felts(&[0, 1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(check_query(&spec, step, &plain), Ok(()));
        plain.columns.insert(x, felts(&[0, 1, 2, 2, 4, 5, 6, 7]));
        assert_eq!(check_query(&spec, step, &plain), Err(QueryFailure::GlobalRow { row: 3 }));
    }

    #[test]
    fn cyclic_constraints_include_the_wrapping_row() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 4)?;
            b.global_cyclic("rotate", Expr::column(x) - Expr::shifted(x, -1))?;
            Ok(())
        })
        .unwrap();
        let mut plain = Plain::default();
        plain.columns.insert(spec.column_id("x").unwrap(), felts(&[5, 5, 5, 6]));
        assert_eq!(
            check_query(&spec, spec.query_id("rotate").unwrap(), &plain),
            Err(QueryFailure::GlobalRow { row: 0 })
        );
    }

    #[test]
    fn filtered_inclusion_ignores_inactive_rows() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 4)?;
            let f = b.commit("f", 4)?;
            let t = b.precomputed("t", felts(&[1, 2, 3, 4]))?;
            b.inclusion_filtered("lookup", &[x], &[t], f)?;
            Ok(())
        })
        .unwrap();
        let mut plain = Plain::default();
        plain.columns.insert(spec.column_id("x").unwrap(), felts(&[1, 9, 3, 4]));
        plain.columns.insert(spec.column_id("f").unwrap(), felts(&[1, 0, 1, 1]));
        plain
            .columns
            .insert(spec.column_id("t").unwrap(), felts(&[1, 2, 3, 4]));
        let lookup = spec.query_id("lookup").unwrap();
        assert_eq!(check_query(&spec, lookup, &plain), Ok(()));
        plain.columns.insert(spec.column_id("f").unwrap(), felts(&[1, 1, 1, 1]));
        assert_eq!(
            check_query(&spec, lookup, &plain),
            Err(QueryFailure::MissingTuple { row: 1 })
        );
    }

    #[test]
    fn result_queries_compare_claims() {
        let spec = Builder::define(|b| {
            let a = b.commit("a", 4)?;
            let c = b.commit("c", 4)?;
            b.inner_product("ip", a, &[c])?;
            Ok(())
        })
        .unwrap();
        let mut plain = Plain::default();
        plain.columns.insert(spec.column_id("a").unwrap(), felts(&[1, 2, 3, 4]));
        plain.columns.insert(spec.column_id("c").unwrap(), felts(&[1, 1, 1, 2]));
        let ip = spec.query_id("ip").unwrap();
        plain.params.insert(ip, QueryParams::new(felts(&[14])));
        assert_eq!(check_query(&spec, ip, &plain), Ok(()));
        plain.params.insert(ip, QueryParams::new(felts(&[13])));
        assert!(matches!(
            check_query(&spec, ip, &plain),
            Err(QueryFailure::ResultMismatch { index: 0, .. })
        ));
    }
}
