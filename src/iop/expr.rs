//! Arithmetic expressions over shifted columns and coins.
//!
//! Expressions are built with the usual operators:
//!
//! ```ignore
//! let step = Expr::column(x) - Expr::shifted(x, -1) - Expr::constant(1);
//! ```

use std::collections::BTreeSet;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::ids::{CoinId, ColumnId};
use crate::field::FieldElement;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Const(FieldElement),
    /// Column read at `row + shift`.
    Column { column: ColumnId, shift: isize },
    /// Field coin.
    Coin(CoinId),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn constant(value: u64) -> Self {
        Expr::Const(FieldElement::new(value))
    }

    pub fn column(column: ColumnId) -> Self {
        Expr::Column { column, shift: 0 }
    }

    pub fn shifted(column: ColumnId, shift: isize) -> Self {
        Expr::Column { column, shift }
    }

    pub fn coin(coin: CoinId) -> Self {
        Expr::Coin(coin)
    }

    /// Sum of `terms`, zero when empty.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms
            .into_iter()
            .reduce(|acc, term| acc + term)
            .unwrap_or(Expr::Const(FieldElement::ZERO))
    }

    /// Degree in the column variables; coins count as constants.
    pub fn degree(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Coin(_) => 0,
            Expr::Column { .. } => 1,
            Expr::Add(a, b) | Expr::Sub(a, b) => a.degree().max(b.degree()),
            Expr::Mul(a, b) => a.degree() + b.degree(),
            Expr::Neg(a) => a.degree(),
        }
    }

    /// Distinct `(column, shift)` references in ascending order.
    pub fn column_refs(&self) -> BTreeSet<(ColumnId, isize)> {
        let mut out = BTreeSet::new();
        self.visit(&mut |expr| {
            if let Expr::Column { column, shift } = expr {
                out.insert((*column, *shift));
            }
        });
        out
    }

    pub fn columns(&self) -> BTreeSet<ColumnId> {
        self.column_refs().into_iter().map(|(column, _)| column).collect()
    }

    pub fn coins(&self) -> BTreeSet<CoinId> {
        let mut out = BTreeSet::new();
        self.visit(&mut |expr| {
            if let Expr::Coin(coin) = expr {
                out.insert(*coin);
            }
        });
        out
    }

    fn visit(&self, f: &mut dyn FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Expr::Neg(a) => a.visit(f),
            Expr::Const(_) | Expr::Column { .. } | Expr::Coin(_) => {}
        }
    }

    /// Evaluates at a single point.
    pub fn evaluate<E>(
        &self,
        column: &mut dyn FnMut(ColumnId, isize) -> Result<FieldElement, E>,
        coin: &mut dyn FnMut(CoinId) -> Result<FieldElement, E>,
    ) -> Result<FieldElement, E> {
        Ok(match self {
            Expr::Const(value) => *value,
            Expr::Column { column: id, shift } => column(*id, *shift)?,
            Expr::Coin(id) => coin(*id)?,
            Expr::Add(a, b) => a.evaluate(column, coin)? + b.evaluate(column, coin)?,
            Expr::Sub(a, b) => a.evaluate(column, coin)? - b.evaluate(column, coin)?,
            Expr::Mul(a, b) => a.evaluate(column, coin)? * b.evaluate(column, coin)?,
            Expr::Neg(a) => -a.evaluate(column, coin)?,
        })
    }

    /// Evaluates row-wise over `len` points. `column` returns the full vector
    /// of values of the referenced column already rotated by `shift`.
    pub fn evaluate_vector<E>(
        &self,
        len: usize,
        column: &mut dyn FnMut(ColumnId, isize) -> Result<Vec<FieldElement>, E>,
        coin: &mut dyn FnMut(CoinId) -> Result<FieldElement, E>,
    ) -> Result<Vec<FieldElement>, E> {
        Ok(match self.evaluate_lanes(column, coin)? {
            Lanes::Scalar(value) => vec![value; len],
            Lanes::Vector(values) => values,
        })
    }

    fn evaluate_lanes<E>(
        &self,
        column: &mut dyn FnMut(ColumnId, isize) -> Result<Vec<FieldElement>, E>,
        coin: &mut dyn FnMut(CoinId) -> Result<FieldElement, E>,
    ) -> Result<Lanes, E> {
        Ok(match self {
            Expr::Const(value) => Lanes::Scalar(*value),
            Expr::Column { column: id, shift } => Lanes::Vector(column(*id, *shift)?),
            Expr::Coin(id) => Lanes::Scalar(coin(*id)?),
            Expr::Add(a, b) => a
                .evaluate_lanes(column, coin)?
                .combine(b.evaluate_lanes(column, coin)?, |x, y| x + y),
            Expr::Sub(a, b) => a
                .evaluate_lanes(column, coin)?
                .combine(b.evaluate_lanes(column, coin)?, |x, y| x - y),
            Expr::Mul(a, b) => a
                .evaluate_lanes(column, coin)?
                .combine(b.evaluate_lanes(column, coin)?, |x, y| x * y),
            Expr::Neg(a) => match a.evaluate_lanes(column, coin)? {
                Lanes::Scalar(value) => Lanes::Scalar(-value),
                Lanes::Vector(mut values) => {
                    values.iter_mut().for_each(|v| *v = -*v);
                    Lanes::Vector(values)
                }
            },
        })
    }
}

enum Lanes {
    Scalar(FieldElement),
    Vector(Vec<FieldElement>),
}

impl Lanes {
    fn combine(self, other: Lanes, op: fn(FieldElement, FieldElement) -> FieldElement) -> Lanes {
        match (self, other) {
            (Lanes::Scalar(a), Lanes::Scalar(b)) => Lanes::Scalar(op(a, b)),
            (Lanes::Scalar(a), Lanes::Vector(mut b)) => {
                b.iter_mut().for_each(|v| *v = op(a, *v));
                Lanes::Vector(b)
            }
            (Lanes::Vector(mut a), Lanes::Scalar(b)) => {
                a.iter_mut().for_each(|v| *v = op(*v, b));
                Lanes::Vector(a)
            }
            (Lanes::Vector(mut a), Lanes::Vector(b)) => {
                a.iter_mut().zip(b).for_each(|(x, y)| *x = op(*x, y));
                Lanes::Vector(a)
            }
        }
    }
}

/// Rotates `values` so that entry `i` of the result is `values[i + shift]`
/// (indices taken modulo the length).
pub fn rotate(values: &[FieldElement], shift: isize) -> Vec<FieldElement> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let offset = shift.rem_euclid(n as isize) as usize;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&values[offset..]);
    out.extend_from_slice(&values[..offset]);
    out
}

impl From<FieldElement> for Expr {
    fn from(value: FieldElement) -> Self {
        Expr::Const(value)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}
