//! Field arithmetic primitives.
//! Contains the Goldilocks base field, its quadratic extension and
//! polynomial utilities over the base field.

pub mod extension;
pub mod polynomial;
pub mod prime_field;

pub use extension::ExtElement;
pub use prime_field::{batch_inverse, CanonicalSerialize, FieldDeserializeError, FieldElement};

#[cfg(test)]
pub mod tests;
