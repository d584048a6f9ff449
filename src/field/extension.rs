//! Quadratic extension `F[X]/(X^2 - 7)` of the Goldilocks field.
//!
//! `7` is a quadratic non-residue (it generates the multiplicative group),
//! so the quotient is a field. Extension-typed coins live here.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::FieldElement;

const NON_RESIDUE: FieldElement = FieldElement(7);

/// Element `c0 + c1 * X` with `X^2 = 7`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtElement {
    pub c0: FieldElement,
    pub c1: FieldElement,
}

impl fmt::Debug for ExtElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtElement({} + {}*X)", self.c0, self.c1)
    }
}

impl ExtElement {
    pub const ZERO: ExtElement = ExtElement {
        c0: FieldElement::ZERO,
        c1: FieldElement::ZERO,
    };
    pub const ONE: ExtElement = ExtElement {
        c0: FieldElement::ONE,
        c1: FieldElement::ZERO,
    };

    pub const fn new(c0: FieldElement, c1: FieldElement) -> Self {
        Self { c0, c1 }
    }

    /// Embeds a base field element.
    pub const fn from_base(value: FieldElement) -> Self {
        Self {
            c0: value,
            c1: FieldElement::ZERO,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.c0.is_zero() && self.c1.is_zero()
    }

    /// `c0^2 - 7 c1^2`, the norm down to the base field.
    pub fn norm(&self) -> FieldElement {
        self.c0.square() - NON_RESIDUE * self.c1.square()
    }

    pub fn inv(&self) -> Option<Self> {
        let norm_inv = self.norm().inv()?;
        Some(Self {
            c0: self.c0 * norm_inv,
            c1: -self.c1 * norm_inv,
        })
    }
}

impl From<FieldElement> for ExtElement {
    fn from(value: FieldElement) -> Self {
        Self::from_base(value)
    }
}

impl Add for ExtElement {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.c0 + rhs.c0, self.c1 + rhs.c1)
    }
}

impl Sub for ExtElement {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.c0 - rhs.c0, self.c1 - rhs.c1)
    }
}

impl Neg for ExtElement {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.c0, -self.c1)
    }
}

impl Mul for ExtElement {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let c0 = self.c0 * rhs.c0 + NON_RESIDUE * self.c1 * rhs.c1;
        let c1 = self.c0 * rhs.c1 + self.c1 * rhs.c0;
        Self::new(c0, c1)
    }
}
