//! Polynomial utilities operating over the prime field.
//!
//! Columns are stored in Lagrange form over the subgroup `H_n` of size `n`
//! (value `i` is the evaluation at `w_n^i`). The helpers here move between
//! that view and coefficient form without an FFT when only one point is
//! needed.

use super::{batch_inverse, FieldElement};

/// Dense polynomial represented by coefficients in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    /// Coefficients starting from the constant term.
    pub coefficients: Vec<FieldElement>,
}

impl Polynomial {
    /// Constructs a polynomial from raw coefficients.
    pub fn new(coefficients: Vec<FieldElement>) -> Self {
        Self { coefficients }
    }

    /// Evaluates the polynomial at the provided point using Horner's method.
    pub fn evaluate(&self, point: FieldElement) -> FieldElement {
        horner(&self.coefficients, point)
    }

    /// Returns the degree of the polynomial or `None` if the polynomial is zero.
    pub fn degree(&self) -> Option<usize> {
        self.coefficients.iter().rposition(|coeff| !coeff.is_zero())
    }

    /// Divides by `(X - root)`, returning the quotient and the remainder
    /// (which equals the evaluation at `root`).
    pub fn divide_by_linear(&self, root: FieldElement) -> (Polynomial, FieldElement) {
        let n = self.coefficients.len();
        if n == 0 {
            return (Polynomial::new(Vec::new()), FieldElement::ZERO);
        }
        let mut quotient = vec![FieldElement::ZERO; n - 1];
        let mut carry = FieldElement::ZERO;
        for idx in (0..n).rev() {
            let value = self.coefficients[idx] + carry * root;
            if idx == 0 {
                return (Polynomial::new(quotient), value);
            }
            quotient[idx - 1] = value;
            carry = value;
        }
        (Polynomial::new(quotient), FieldElement::ZERO)
    }
}

/// Horner evaluation of `sum coeffs[i] * x^i`.
pub fn horner(coefficients: &[FieldElement], point: FieldElement) -> FieldElement {
    coefficients
        .iter()
        .rev()
        .fold(FieldElement::ZERO, |acc, coeff| acc * point + *coeff)
}

/// Evaluates the polynomial whose values over `H_n` are `values` at `point`.
///
/// Uses the barycentric formula
/// `P(x) = (x^n - 1) / n * sum_i v_i w^i / (x - w^i)`; when `point` lies in
/// the subgroup the matching value is returned directly. Returns `None` when
/// `values.len()` is not a power of two within the two-adicity.
pub fn lagrange_evaluate(values: &[FieldElement], point: FieldElement) -> Option<FieldElement> {
    let n = values.len();
    if !n.is_power_of_two() {
        return None;
    }
    if n == 1 {
        return Some(values[0]);
    }
    let omega = FieldElement::root_of_unity(n.trailing_zeros() as usize)?;
    let vanishing = point.pow(n as u64) - FieldElement::ONE;
    if vanishing.is_zero() {
        let mut current = FieldElement::ONE;
        for value in values {
            if current == point {
                return Some(*value);
            }
            current *= omega;
        }
        return None;
    }

    let mut powers = Vec::with_capacity(n);
    let mut denominators = Vec::with_capacity(n);
    let mut current = FieldElement::ONE;
    for _ in 0..n {
        powers.push(current);
        denominators.push(point - current);
        current *= omega;
    }
    let inverses = batch_inverse(&denominators)?;
    let sum: FieldElement = values
        .iter()
        .zip(powers.iter().zip(inverses.iter()))
        .map(|(value, (power, inverse))| *value * *power * *inverse)
        .sum();
    let n_inv = FieldElement::from(n as u64).inv()?;
    Some(vanishing * n_inv * sum)
}

/// `point^n - 1`, the vanishing polynomial of `H_n`.
pub fn vanishing_at(point: FieldElement, n: usize) -> FieldElement {
    point.pow(n as u64) - FieldElement::ONE
}
