//! MiMC over the Goldilocks field.
//!
//! The permutation keyed by `h` maps `x_0 = m` through
//! `x_{i+1} = (x_i + h + c_i)^7` for [`MIMC_ROUNDS`] rounds, and the
//! Miyaguchi-Preneel compression is `C(h, m) = x_R + 2h + m` (the permutation
//! output plus the key plus the feed-forward of the message). `x^7` is a
//! bijection because `gcd(7, p - 1) = 1`.

use once_cell::sync::Lazy;

use super::Blake2sXof;
use crate::field::FieldElement;

/// Number of rounds of the keyed permutation.
pub const MIMC_ROUNDS: usize = 24;

/// Degree of the round S-box.
pub const MIMC_SBOX_DEGREE: u64 = 7;

static ROUND_CONSTANTS: Lazy<[FieldElement; MIMC_ROUNDS]> = Lazy::new(|| {
    let mut xof = Blake2sXof::new(b"rpp-wizard/mimc-goldilocks/round-constants");
    let mut constants = [FieldElement::ZERO; MIMC_ROUNDS];
    for constant in constants.iter_mut() {
        *constant = FieldElement::from_transcript_bytes(&xof.next_block());
    }
    constants
});

pub fn round_constants() -> &'static [FieldElement; MIMC_ROUNDS] {
    &ROUND_CONSTANTS
}

#[inline]
fn sbox(x: FieldElement) -> FieldElement {
    let x2 = x.square();
    let x4 = x2.square();
    x4 * x2 * x
}

/// Intermediate states `x_1..=x_R` of the keyed permutation on `msg`.
pub fn permutation_trace(key: FieldElement, msg: FieldElement) -> [FieldElement; MIMC_ROUNDS] {
    let constants = round_constants();
    let mut states = [FieldElement::ZERO; MIMC_ROUNDS];
    let mut x = msg;
    for (state, constant) in states.iter_mut().zip(constants.iter()) {
        x = sbox(x + key + *constant);
        *state = x;
    }
    states
}

/// Miyaguchi-Preneel compression `C(key, msg)`.
pub fn compress(key: FieldElement, msg: FieldElement) -> FieldElement {
    let last = permutation_trace(key, msg)[MIMC_ROUNDS - 1];
    last + key.double() + msg
}

/// Sequential hash of a vector: chained compressions starting from zero.
pub fn hash_elements(values: &[FieldElement]) -> FieldElement {
    values
        .iter()
        .fold(FieldElement::ZERO, |state, value| compress(state, *value))
}
