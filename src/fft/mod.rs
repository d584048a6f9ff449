//! Radix-2 number-theoretic transforms over the Goldilocks field.
//!
//! Domains are multiplicative subgroups `H_n = <w_n>` with
//! `w_n = root^(2^32 / n)`; evaluations are kept in natural order
//! (`values[i] = P(w_n^i)`). Twiddle tables are cached per domain size and
//! shared between callers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::field::FieldElement;

pub mod lde;

pub use lde::{decode, encode, extend, CodecError};

/// Maximum supported radix-2 domain size expressed as `log2(n)`.
pub const RADIX2_MAX_LOG2_SIZE: usize = FieldElement::TWO_ADICITY;

/// Offset used for coset evaluations (`g * H_n`); never in any `H_n`.
pub const COSET_OFFSET: FieldElement = FieldElement::GENERATOR;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FftError {
    #[error("domain size {size} is not a power of two")]
    NotPowerOfTwo { size: usize },
    #[error("domain size 2^{log2_size} exceeds the field two-adicity")]
    TooLarge { log2_size: usize },
    #[error("input length {got} does not match domain size {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

#[derive(Debug)]
struct Twiddles {
    forward: Vec<FieldElement>,
    inverse: Vec<FieldElement>,
}

static TWIDDLE_CACHE: OnceLock<Mutex<HashMap<usize, Arc<Twiddles>>>> = OnceLock::new();

fn twiddles_for(log2_size: usize, root: FieldElement, root_inv: FieldElement) -> Arc<Twiddles> {
    let cache = TWIDDLE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard
        .entry(log2_size)
        .or_insert_with(|| {
            let half = (1usize << log2_size) / 2;
            let mut forward = Vec::with_capacity(half);
            let mut inverse = Vec::with_capacity(half);
            let (mut f, mut i) = (FieldElement::ONE, FieldElement::ONE);
            for _ in 0..half {
                forward.push(f);
                inverse.push(i);
                f *= root;
                i *= root_inv;
            }
            Arc::new(Twiddles { forward, inverse })
        })
        .clone()
}

/// Canonical radix-2 evaluation domain.
#[derive(Debug, Clone)]
pub struct Radix2Domain {
    log2_size: usize,
    generator: FieldElement,
    generator_inv: FieldElement,
    size_inv: FieldElement,
    twiddles: Arc<Twiddles>,
}

impl Radix2Domain {
    /// Builds the domain `H_size`.
    pub fn new(size: usize) -> Result<Self, FftError> {
        if !size.is_power_of_two() {
            return Err(FftError::NotPowerOfTwo { size });
        }
        let log2_size = size.trailing_zeros() as usize;
        let generator =
            FieldElement::root_of_unity(log2_size).ok_or(FftError::TooLarge { log2_size })?;
        // Roots of unity and `size < p` are never zero.
        let generator_inv = generator.inv().unwrap_or(FieldElement::ONE);
        let size_inv = FieldElement::from(size as u64)
            .inv()
            .unwrap_or(FieldElement::ONE);
        let twiddles = twiddles_for(log2_size, generator, generator_inv);
        Ok(Self {
            log2_size,
            generator,
            generator_inv,
            size_inv,
            twiddles,
        })
    }

    pub fn size(&self) -> usize {
        1 << self.log2_size
    }

    pub fn log2_size(&self) -> usize {
        self.log2_size
    }

    /// Primitive root `w_n` generating the domain.
    pub fn generator(&self) -> FieldElement {
        self.generator
    }

    pub fn generator_inv(&self) -> FieldElement {
        self.generator_inv
    }

    /// `w_n^index` (index taken modulo the size).
    pub fn element(&self, index: usize) -> FieldElement {
        self.generator.pow((index % self.size()) as u64)
    }

    /// Coefficients to evaluations over `H_n`, in place.
    pub fn fft(&self, values: &mut [FieldElement]) -> Result<(), FftError> {
        self.check_len(values)?;
        transform(values, &self.twiddles.forward);
        Ok(())
    }

    /// Evaluations over `H_n` to coefficients, in place.
    pub fn ifft(&self, values: &mut [FieldElement]) -> Result<(), FftError> {
        self.check_len(values)?;
        transform(values, &self.twiddles.inverse);
        for value in values.iter_mut() {
            *value *= self.size_inv;
        }
        Ok(())
    }

    /// Coefficients to evaluations over the coset `offset * H_n`.
    pub fn coset_fft(&self, values: &mut [FieldElement], offset: FieldElement) -> Result<(), FftError> {
        self.check_len(values)?;
        scale_by_powers(values, offset);
        self.fft(values)
    }

    /// Evaluations over `offset * H_n` to coefficients.
    pub fn coset_ifft(&self, values: &mut [FieldElement], offset: FieldElement) -> Result<(), FftError> {
        self.ifft(values)?;
        // offset is the group generator, never zero.
        scale_by_powers(values, offset.inv().unwrap_or(FieldElement::ONE));
        Ok(())
    }

    fn check_len(&self, values: &[FieldElement]) -> Result<(), FftError> {
        if values.len() != self.size() {
            return Err(FftError::LengthMismatch {
                expected: self.size(),
                got: values.len(),
            });
        }
        Ok(())
    }
}

fn scale_by_powers(values: &mut [FieldElement], factor: FieldElement) {
    let mut current = FieldElement::ONE;
    for value in values.iter_mut() {
        *value *= current;
        current *= factor;
    }
}

fn bit_reverse_permute(values: &mut [FieldElement]) {
    let n = values.len();
    let bits = n.trailing_zeros();
    if bits == 0 {
        return;
    }
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            values.swap(i, j);
        }
    }
}

/// Iterative Cooley-Tukey over natural-order input; `twiddles[k] = root^k`
/// for `k < n/2`.
fn transform(values: &mut [FieldElement], twiddles: &[FieldElement]) {
    let n = values.len();
    if n <= 1 {
        return;
    }
    bit_reverse_permute(values);
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let stride = n / len;
        for block in values.chunks_mut(len) {
            for j in 0..half {
                let u = block[j];
                let v = block[j + half] * twiddles[j * stride];
                block[j] = u + v;
                block[j + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Lagrange values over `H_n` to coefficients.
pub fn interpolate(values: &[FieldElement]) -> Result<Vec<FieldElement>, FftError> {
    let domain = Radix2Domain::new(values.len())?;
    let mut coeffs = values.to_vec();
    domain.ifft(&mut coeffs)?;
    Ok(coeffs)
}

/// Coefficients (zero-padded) to evaluations over `H_size`.
pub fn evaluate(coefficients: &[FieldElement], size: usize) -> Result<Vec<FieldElement>, FftError> {
    let domain = Radix2Domain::new(size)?;
    if coefficients.len() > size {
        return Err(FftError::LengthMismatch {
            expected: size,
            got: coefficients.len(),
        });
    }
    let mut values = coefficients.to_vec();
    values.resize(size, FieldElement::ZERO);
    domain.fft(&mut values)?;
    Ok(values)
}
