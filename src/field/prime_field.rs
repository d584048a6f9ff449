//! Goldilocks prime field `p = 2^64 - 2^32 + 1`.
//!
//! Elements are stored in canonical form (`0 <= value < p`) so equality,
//! hashing and serialization never need a reduction step. Multiplication
//! reduces the 128-bit product using `2^64 = 2^32 - 1 (mod p)` and
//! `2^96 = -1 (mod p)`.

use core::fmt;
use core::iter::{Product, Sum};
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Metadata describing the underlying field modulus.
#[derive(Debug, Clone, Copy)]
pub struct Modulus {
    /// Prime modulus value in canonical representation.
    pub value: u64,
    /// Indicates whether the modulus passed primality checks during configuration.
    pub is_prime: bool,
}

impl Modulus {
    /// Creates a new modulus descriptor.
    pub const fn new(value: u64, is_prime: bool) -> Self {
        Self { value, is_prime }
    }
}

/// Default modulus used across the crate.
pub const DEFAULT_MODULUS: Modulus = Modulus::new(0xffff_ffff_0000_0001, true);

const P: u64 = DEFAULT_MODULUS.value;
/// `2^64 mod p`.
const EPSILON: u64 = 0xffff_ffff;

/// Field element represented as a canonical value modulo the prime.
///
/// Serialization (both the byte codec and serde) uses the canonical `u64`
/// and rejects values `>= p`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "CanonicalU64", into = "u64")]
pub struct FieldElement(pub u64);

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldElement").field(&self.0).finish()
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FieldElement {
    /// Canonical prime modulus associated with this field.
    pub const MODULUS: Modulus = DEFAULT_MODULUS;
    /// Generator of the full multiplicative group.
    pub const GENERATOR: FieldElement = FieldElement(7);
    /// Largest `k` such that `2^k` divides `p - 1`.
    pub const TWO_ADICITY: usize = 32;
    /// Additive identity in canonical form.
    pub const ZERO: FieldElement = FieldElement(0);
    /// Multiplicative identity in canonical form.
    pub const ONE: FieldElement = FieldElement(1);

    /// Reduces an arbitrary `u64` into the field.
    pub const fn new(value: u64) -> Self {
        if value >= P {
            FieldElement(value - P)
        } else {
            FieldElement(value)
        }
    }

    /// Returns the element only when `value` is already canonical.
    pub const fn from_canonical(value: u64) -> Option<Self> {
        if value < P {
            Some(FieldElement(value))
        } else {
            None
        }
    }

    pub const fn zero() -> Self {
        Self::ZERO
    }

    pub const fn one() -> Self {
        Self::ONE
    }

    /// Canonical integer representative.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Maps a 32-byte transcript output to a field element by reducing its
    /// first 16 bytes (little endian) modulo `p`. The bias is below `2^-64`.
    pub fn from_transcript_bytes(bytes: &[u8; 32]) -> Self {
        let mut wide = [0u8; 16];
        wide.copy_from_slice(&bytes[..16]);
        FieldElement(reduce128(u128::from_le_bytes(wide)))
    }

    pub fn double(self) -> Self {
        self + self
    }

    pub fn square(self) -> Self {
        self * self
    }

    /// Square-and-multiply exponentiation.
    pub fn pow(self, mut exponent: u64) -> Self {
        let mut base = self;
        let mut acc = Self::ONE;
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc *= base;
            }
            base = base.square();
            exponent >>= 1;
        }
        acc
    }

    /// Multiplicative inverse via Fermat's little theorem, `None` for zero.
    pub fn inv(self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(self.pow(P - 2))
        }
    }

    /// Primitive `2^log2_size`-th root of unity, `None` past the two-adicity.
    pub fn root_of_unity(log2_size: usize) -> Option<Self> {
        if log2_size > Self::TWO_ADICITY {
            return None;
        }
        let max_root = Self::GENERATOR.pow((P - 1) >> Self::TWO_ADICITY);
        Some(max_root.pow(1u64 << (Self::TWO_ADICITY - log2_size)))
    }
}

/// Reduces a 128-bit integer modulo `p`.
#[inline]
pub(crate) fn reduce128(x: u128) -> u64 {
    let x_lo = x as u64;
    let x_hi = (x >> 64) as u64;
    let x_hi_hi = x_hi >> 32;
    let x_hi_lo = x_hi & EPSILON;

    let (mut t0, borrow) = x_lo.overflowing_sub(x_hi_hi);
    if borrow {
        t0 = t0.wrapping_sub(EPSILON);
    }
    let t1 = x_hi_lo * EPSILON;
    let (sum, carry) = t0.overflowing_add(t1);
    let t2 = sum.wrapping_add(EPSILON * carry as u64);
    if t2 >= P {
        t2 - P
    } else {
        t2
    }
}

impl Add for FieldElement {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let sum = self.0 as u128 + rhs.0 as u128;
        if sum >= P as u128 {
            FieldElement((sum - P as u128) as u64)
        } else {
            FieldElement(sum as u64)
        }
    }
}

impl Sub for FieldElement {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        if self.0 >= rhs.0 {
            FieldElement(self.0 - rhs.0)
        } else {
            FieldElement(P - (rhs.0 - self.0))
        }
    }
}

impl Mul for FieldElement {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        FieldElement(reduce128(self.0 as u128 * rhs.0 as u128))
    }
}

impl Neg for FieldElement {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        if self.0 == 0 {
            self
        } else {
            FieldElement(P - self.0)
        }
    }
}

impl AddAssign for FieldElement {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FieldElement {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for FieldElement {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for FieldElement {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Product for FieldElement {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |acc, x| acc * x)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        FieldElement(value as u64)
    }
}

impl From<bool> for FieldElement {
    fn from(value: bool) -> Self {
        FieldElement(value as u64)
    }
}

impl From<FieldElement> for u64 {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

/// Serde input for [`FieldElement`]; values `>= p` are refused.
#[derive(Deserialize)]
#[serde(transparent)]
struct CanonicalU64(u64);

impl TryFrom<CanonicalU64> for FieldElement {
    type Error = FieldDeserializeError;

    fn try_from(value: CanonicalU64) -> Result<Self, Self::Error> {
        Self::from_canonical(value.0).ok_or(FieldDeserializeError::FieldDeserializeNonCanonical)
    }
}

/// Reference-taking arithmetic contract used by generic helpers.
pub trait FieldElementOps: Sized {
    /// Adds two canonical field elements, returning the canonical representative.
    fn add(&self, rhs: &Self) -> Self;
    /// Subtracts `rhs` from `self` in canonical form.
    fn sub(&self, rhs: &Self) -> Self;
    /// Computes the additive inverse of `self`.
    fn neg(&self) -> Self;
    /// Multiplies two field elements.
    fn mul(&self, rhs: &Self) -> Self;
    /// Squares the field element.
    fn square(&self) -> Self;
    /// Computes the multiplicative inverse, returning `None` for zero.
    fn inv(&self) -> Option<Self>;
}

impl FieldElementOps for FieldElement {
    fn add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }

    fn sub(&self, rhs: &Self) -> Self {
        *self - *rhs
    }

    fn neg(&self) -> Self {
        -*self
    }

    fn mul(&self, rhs: &Self) -> Self {
        *self * *rhs
    }

    fn square(&self) -> Self {
        FieldElement::square(*self)
    }

    fn inv(&self) -> Option<Self> {
        FieldElement::inv(*self)
    }
}

/// Errors raised while decoding field elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldDeserializeError {
    /// The encoded integer is not below the modulus.
    #[error("field element deserialization failed: non-canonical input")]
    FieldDeserializeNonCanonical,
}

/// Trait defining serialization requirements for field elements.
pub trait CanonicalSerialize: Sized {
    /// Canonical serialization output type (e.g. `[u8; 8]`).
    type Bytes;

    /// Serializes the element into canonical little-endian bytes.
    fn to_bytes(&self) -> Self::Bytes;

    /// Attempts to deserialize from canonical little-endian bytes.
    fn from_bytes(bytes: &Self::Bytes) -> Result<Self, FieldDeserializeError>;
}

impl CanonicalSerialize for FieldElement {
    type Bytes = [u8; 8];

    fn to_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    fn from_bytes(bytes: &[u8; 8]) -> Result<Self, FieldDeserializeError> {
        FieldElement::from_canonical(u64::from_le_bytes(*bytes))
            .ok_or(FieldDeserializeError::FieldDeserializeNonCanonical)
    }
}

/// Inverts every element with a single field inversion.
///
/// Returns `None` when any input is zero.
pub fn batch_inverse(values: &[FieldElement]) -> Option<Vec<FieldElement>> {
    let mut prefix = Vec::with_capacity(values.len());
    let mut acc = FieldElement::ONE;
    for value in values {
        if value.is_zero() {
            return None;
        }
        prefix.push(acc);
        acc *= *value;
    }
    let mut inv = acc.inv()?;
    let mut out = vec![FieldElement::ZERO; values.len()];
    for idx in (0..values.len()).rev() {
        out[idx] = inv * prefix[idx];
        inv *= values[idx];
    }
    Some(out)
}
