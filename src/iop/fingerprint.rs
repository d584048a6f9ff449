//! Canonical absorption of queries and verifier-column recipes into the
//! specification fingerprint.
//!
//! Every variant starts with a one-byte tag; vectors carry their length.

use super::column::VerifierColumn;
use super::expr::Expr;
use super::ids::{CoinId, ColumnId};
use super::query::{EvalPoint, Query};
use crate::hash::Hasher;

fn absorb_ids(hasher: &mut Hasher, ids: &[ColumnId]) {
    hasher.update_u64(ids.len() as u64);
    for id in ids {
        hasher.update_u64(id.index() as u64);
    }
}

fn absorb_coin(hasher: &mut Hasher, coin: CoinId) {
    hasher.update_u64(coin.index() as u64);
}

pub(crate) fn absorb_expr(hasher: &mut Hasher, expr: &Expr) {
    match expr {
        Expr::Const(value) => {
            hasher.update(&[0]);
            hasher.update_u64(value.as_u64());
        }
        Expr::Column { column, shift } => {
            hasher.update(&[1]);
            hasher.update_u64(column.index() as u64);
            hasher.update(&(*shift as i64).to_le_bytes());
        }
        Expr::Coin(coin) => {
            hasher.update(&[2]);
            absorb_coin(hasher, *coin);
        }
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
            let tag = match expr {
                Expr::Add(..) => 3,
                Expr::Sub(..) => 4,
                _ => 5,
            };
            hasher.update(&[tag]);
            absorb_expr(hasher, a);
            absorb_expr(hasher, b);
        }
        Expr::Neg(a) => {
            hasher.update(&[6]);
            absorb_expr(hasher, a);
        }
    }
}

fn absorb_point(hasher: &mut Hasher, point: &EvalPoint) {
    match point {
        EvalPoint::Constant(value) => {
            hasher.update(&[0]);
            hasher.update_u64(value.as_u64());
        }
        EvalPoint::Coin(coin) => {
            hasher.update(&[1]);
            absorb_coin(hasher, *coin);
        }
        EvalPoint::ScaledCoin { coin, factor } => {
            hasher.update(&[2]);
            absorb_coin(hasher, *coin);
            hasher.update_u64(factor.as_u64());
        }
        EvalPoint::RootPower {
            coin,
            index,
            domain_size,
        } => {
            hasher.update(&[3]);
            absorb_coin(hasher, *coin);
            hasher.update_u64(*index as u64);
            hasher.update_u64(*domain_size as u64);
        }
    }
}

pub(crate) fn absorb_query(hasher: &mut Hasher, query: &Query) {
    match query {
        Query::Global(q) => {
            hasher.update(&[0, q.cyclic as u8]);
            hasher.update_u64(q.domain_size as u64);
            absorb_expr(hasher, &q.expr);
        }
        Query::Local(q) => {
            hasher.update(&[1]);
            hasher.update_u64(q.domain_size as u64);
            absorb_expr(hasher, &q.expr);
        }
        Query::Permutation(q) => {
            hasher.update(&[2]);
            absorb_ids(hasher, &q.a);
            absorb_ids(hasher, &q.b);
        }
        Query::Inclusion(q) => {
            hasher.update(&[3]);
            absorb_ids(hasher, &q.included);
            absorb_ids(hasher, &q.including);
            match q.filter {
                Some(filter) => {
                    hasher.update(&[1]);
                    hasher.update_u64(filter.index() as u64);
                }
                None => hasher.update(&[0]),
            }
        }
        Query::InnerProduct(q) => {
            hasher.update(&[4]);
            hasher.update_u64(q.a.index() as u64);
            absorb_ids(hasher, &q.bs);
        }
        Query::UnivariateEval(q) => {
            hasher.update(&[5]);
            absorb_ids(hasher, &q.columns);
            absorb_point(hasher, &q.point);
        }
        Query::Range(q) => {
            hasher.update(&[6]);
            hasher.update_u64(q.column.index() as u64);
            hasher.update_u64(q.bound);
        }
        Query::LocalOpening(q) => {
            hasher.update(&[7]);
            hasher.update_u64(q.column.index() as u64);
            hasher.update_u64(q.position as u64);
        }
    }
}

pub(crate) fn absorb_recipe(hasher: &mut Hasher, recipe: &VerifierColumn) {
    match recipe {
        VerifierColumn::IntegerCoin { coin } => {
            hasher.update(&[0]);
            absorb_coin(hasher, *coin);
        }
        VerifierColumn::DigestSlots { slots } => {
            hasher.update(&[1]);
            hasher.update_u64(slots.len() as u64);
            for slot in slots {
                hasher.update_u64(slot.index() as u64);
            }
        }
        VerifierColumn::QueryResults { queries } => {
            hasher.update(&[2]);
            hasher.update_u64(queries.len() as u64);
            for query in queries {
                hasher.update_u64(query.index() as u64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;
    use crate::iop::query::{Range, UnivariateEval};

    fn digest(f: impl FnOnce(&mut Hasher)) -> [u8; 32] {
        let mut hasher = Hasher::new();
        f(&mut hasher);
        hasher.finalize().into_bytes()
    }

    #[test]
    fn operators_and_operands_are_distinguished() {
        let x = Expr::column(ColumnId::from_index(0));
        let y = Expr::column(ColumnId::from_index(1));
        let sum = digest(|h| absorb_expr(h, &(x.clone() + y.clone())));
        let difference = digest(|h| absorb_expr(h, &(x.clone() - y.clone())));
        let swapped = digest(|h| absorb_expr(h, &(y.clone() + x.clone())));
        let shifted = digest(|h| absorb_expr(h, &(Expr::shifted(ColumnId::from_index(0), -1) + y)));
        assert_ne!(sum, difference);
        assert_ne!(sum, swapped);
        assert_ne!(sum, shifted);
        assert_eq!(sum, digest(|h| absorb_expr(h, &(x + Expr::column(ColumnId::from_index(1))))));
    }

    #[test]
    fn query_parameters_move_the_digest() {
        let range = |bound| {
            Query::Range(Range {
                column: ColumnId::from_index(2),
                bound,
            })
        };
        assert_ne!(digest(|h| absorb_query(h, &range(8))), digest(|h| absorb_query(h, &range(9))));

        let eval = |value| {
            Query::UnivariateEval(UnivariateEval {
                columns: vec![ColumnId::from_index(0)],
                point: EvalPoint::Constant(FieldElement::new(value)),
            })
        };
        assert_ne!(digest(|h| absorb_query(h, &eval(3))), digest(|h| absorb_query(h, &eval(4))));
    }
}
