//! Reed-Solomon encoding over radix-2 domains.
//!
//! A message of length `n` is read as Lagrange values over `H_n`; its
//! codeword with blow-up `b` is the evaluation of the same polynomial over
//! `H_{n*b}`. Since `H_n` is a subgroup of `H_{n*b}`, the message sits at
//! every `b`-th codeword position.

use super::{FftError, Radix2Domain};
use crate::field::FieldElement;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Fft(#[from] FftError),
    #[error("blow-up factor {blowup} must be a power of two greater than one")]
    InvalidBlowup { blowup: usize },
    #[error("codeword length {len} is not a multiple of the blow-up factor {blowup}")]
    InvalidLength { len: usize, blowup: usize },
    #[error("word is not a codeword: coefficient {degree} is non-zero")]
    NotACodeword { degree: usize },
}

/// Re-evaluates the polynomial with Lagrange values `values` (over `H_n`)
/// over the larger domain `H_target`.
pub fn extend(values: &[FieldElement], target: usize) -> Result<Vec<FieldElement>, CodecError> {
    if target == values.len() {
        return Ok(values.to_vec());
    }
    let small = Radix2Domain::new(values.len())?;
    let large = Radix2Domain::new(target)?;
    if target < values.len() {
        return Err(CodecError::Fft(FftError::LengthMismatch {
            expected: values.len(),
            got: target,
        }));
    }
    let mut coeffs = values.to_vec();
    small.ifft(&mut coeffs)?;
    coeffs.resize(target, FieldElement::ZERO);
    large.fft(&mut coeffs)?;
    Ok(coeffs)
}

/// Reed-Solomon encodes `message` with rate `1 / blowup`.
pub fn encode(message: &[FieldElement], blowup: usize) -> Result<Vec<FieldElement>, CodecError> {
    if blowup < 2 || !blowup.is_power_of_two() {
        return Err(CodecError::InvalidBlowup { blowup });
    }
    extend(message, message.len() * blowup)
}

/// Recovers the message from a codeword, rejecting words of too high degree.
pub fn decode(codeword: &[FieldElement], blowup: usize) -> Result<Vec<FieldElement>, CodecError> {
    if blowup < 2 || !blowup.is_power_of_two() {
        return Err(CodecError::InvalidBlowup { blowup });
    }
    if codeword.len() % blowup != 0 {
        return Err(CodecError::InvalidLength {
            len: codeword.len(),
            blowup,
        });
    }
    let large = Radix2Domain::new(codeword.len())?;
    let message_len = codeword.len() / blowup;
    let mut coeffs = codeword.to_vec();
    large.ifft(&mut coeffs)?;
    if let Some(offset) = coeffs[message_len..].iter().position(|c| !c.is_zero()) {
        return Err(CodecError::NotACodeword {
            degree: message_len + offset,
        });
    }
    coeffs.truncate(message_len);
    let small = Radix2Domain::new(message_len)?;
    small.fft(&mut coeffs)?;
    Ok(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_sits_on_subgroup_positions() {
        let message: Vec<FieldElement> = (0..8u64).map(|i| FieldElement::from(i * i)).collect();
        let codeword = encode(&message, 4).unwrap();
        for (i, value) in message.iter().enumerate() {
            assert_eq!(codeword[i * 4], *value);
        }
    }

    #[test]
    fn corrupted_symbol_is_detected() {
        let message: Vec<FieldElement> = (0..8u64).map(FieldElement::from).collect();
        let mut codeword = encode(&message, 2).unwrap();
        assert_eq!(decode(&codeword, 2).unwrap(), message);
        codeword[5] += FieldElement::ONE;
        assert!(matches!(
            decode(&codeword, 2),
            Err(CodecError::NotACodeword { .. })
        ));
    }
}
