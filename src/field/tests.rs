use proptest::prelude::*;

use super::polynomial::{horner, lagrange_evaluate, Polynomial};
use super::prime_field::{
    batch_inverse, CanonicalSerialize, FieldDeserializeError, FieldElement, FieldElementOps,
};

fn felt() -> impl Strategy<Value = FieldElement> {
    (0..FieldElement::MODULUS.value).prop_map(FieldElement)
}

#[test]
fn add_mul_inv_laws_ok() {
    let a = FieldElement::from(5u64);
    let b = FieldElement::from(7u64);

    let sum = a.add(&b);
    assert_eq!(sum, FieldElement::from(12u64));

    let neg_a = FieldElementOps::neg(&a);
    assert_eq!(a.add(&neg_a), FieldElement::ZERO);

    let product = a.mul(&b);
    assert_eq!(product, FieldElement::from(35u64));

    let inv_b = b.inv().expect("inverse exists for non-zero element");
    let product = b.mul(&inv_b);
    assert_eq!(product, FieldElement::ONE);
}

#[test]
fn serde_le_roundtrip_ok() {
    let element = FieldElement::from(42u64);
    let bytes = element.to_bytes();
    let decoded = FieldElement::from_bytes(&bytes).expect("canonical roundtrip");
    assert_eq!(decoded, element);
}

#[test]
fn reject_noncanonical_bytes_err() {
    let noncanonical = FieldElement::MODULUS.value.to_le_bytes();
    let err = FieldElement::from_bytes(&noncanonical)
        .expect_err("non-canonical representation should be rejected");
    assert_eq!(err, FieldDeserializeError::FieldDeserializeNonCanonical);
    assert_eq!(
        err.to_string(),
        "field element deserialization failed: non-canonical input"
    );
}

#[test]
fn serde_json_rejects_noncanonical() {
    let encoded = FieldElement::MODULUS.value.to_string();
    assert!(serde_json::from_str::<FieldElement>(&encoded).is_err());
    let ok: FieldElement = serde_json::from_str("17").expect("canonical");
    assert_eq!(ok, FieldElement::from(17u64));
}

#[test]
fn pow_fermat_inverse_ok() {
    let element = FieldElement::from(19u64);
    let fermat_inverse = element.pow(FieldElement::MODULUS.value - 2);
    let inv = element.inv().expect("inverse exists for non-zero element");
    assert_eq!(fermat_inverse, inv);
    assert_eq!(element * fermat_inverse, FieldElement::ONE);
}

#[test]
fn roots_of_unity_have_exact_order() {
    for log2 in [1usize, 3, 16, 32] {
        let root = FieldElement::root_of_unity(log2).expect("within two-adicity");
        assert_eq!(root.pow(1u64 << log2), FieldElement::ONE);
        assert_ne!(root.pow(1u64 << (log2 - 1)), FieldElement::ONE);
    }
    assert!(FieldElement::root_of_unity(33).is_none());
}

#[test]
fn generator_has_full_order() {
    let order = FieldElement::MODULUS.value - 1;
    for prime in [2u64, 3, 5, 17, 257, 65537] {
        assert_ne!(FieldElement::GENERATOR.pow(order / prime), FieldElement::ONE);
    }
}

#[test]
fn synthetic_division_matches_evaluation() {
    let poly = Polynomial::new((1..=6u64).map(FieldElement::from).collect());
    let root = FieldElement::from(9u64);
    let (quotient, remainder) = poly.divide_by_linear(root);
    assert_eq!(remainder, poly.evaluate(root));
    let x = FieldElement::from(1234u64);
    assert_eq!(
        quotient.evaluate(x) * (x - root) + remainder,
        poly.evaluate(x)
    );
}

#[test]
fn lagrange_evaluation_inside_and_outside_domain() {
    let coeffs: Vec<FieldElement> = (0..8u64).map(|i| FieldElement::from(i * i + 3)).collect();
    let omega = FieldElement::root_of_unity(3).unwrap();
    let values: Vec<FieldElement> = (0..8u64).map(|i| horner(&coeffs, omega.pow(i))).collect();
    assert_eq!(lagrange_evaluate(&values, omega.pow(5)), Some(values[5]));
    let x = FieldElement::from(987_654_321u64);
    assert_eq!(lagrange_evaluate(&values, x), Some(horner(&coeffs, x)));
}

proptest! {
    #[test]
    fn mul_matches_wide_reduction(a in felt(), b in felt()) {
        let expected = (a.0 as u128 * b.0 as u128 % FieldElement::MODULUS.value as u128) as u64;
        prop_assert_eq!((a * b).0, expected);
    }

    #[test]
    fn field_laws(a in felt(), b in felt(), c in felt()) {
        prop_assert_eq!(a + b, b + a);
        prop_assert_eq!((a + b) + c, a + (b + c));
        prop_assert_eq!(a * (b + c), a * b + a * c);
        prop_assert_eq!(a - b + b, a);
        prop_assert_eq!(a + (-a), FieldElement::ZERO);
    }

    #[test]
    fn batch_inverse_matches_single(values in proptest::collection::vec(1..FieldElement::MODULUS.value, 1..16)) {
        let felts: Vec<FieldElement> = values.into_iter().map(FieldElement).collect();
        let inverses = batch_inverse(&felts).expect("non-zero inputs");
        for (value, inverse) in felts.iter().zip(inverses) {
            prop_assert_eq!(*value * inverse, FieldElement::ONE);
        }
    }
}
