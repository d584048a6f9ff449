
use _fixtures::{
    catalogue_spec, catalogue_witness, counter_spec, counter_witness, fast_params, fast_recursive_params, GOOD_COUNTER,
};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use rpp_wizard::compiler::dummy::audit;
use rpp_wizard::field::FieldElement;
use rpp_wizard::proof::ProofLayout;
use rpp_wizard::{prove, verify, Pipeline, ProverOptions, Specification};

static COUNTER: Lazy<(Specification, Specification)> = Lazy::new(|| {
    let spec = counter_spec();
    let compiled = Pipeline::commitment(fast_params()).compile(&spec).unwrap();
    (spec, compiled)
});

static CATALOGUE: Lazy<(Specification, Specification)> = Lazy::new(|| {
    let spec = catalogue_spec(8);
    let compiled = Pipeline::commitment(fast_params()).compile(&spec).unwrap();
    (spec, compiled)
});

static RECURSED_COUNTER: Lazy<Specification> = Lazy::new(|| {
    Pipeline::self_recursive(fast_recursive_params())
        .compile(&counter_spec())
        .unwrap()
});

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn mutated_counters_are_rejected(row in 0usize..8, delta in 1u64..1_000) {
        let (spec, compiled) = &*COUNTER;
        let mut values = GOOD_COUNTER;
        values[row] += delta;
        let witness = counter_witness(&values);
        prop_assert!(audit(spec, &witness).iter().any(|verdict| !verdict.passed()));

        let proof = prove(compiled, &mut counter_witness(&values), &ProverOptions::unchecked()).unwrap();
        prop_assert!(verify(compiled, &proof).is_err());
    }

    #[test]
    fn mutated_catalogue_columns_are_rejected(
        column in prop::sample::select(vec!["a", "b", "s", "u"]),
        row in 0usize..8,
        delta in 1u64..1_000,
    ) {
        let (spec, compiled) = &*CATALOGUE;
        let mut witness = catalogue_witness(8);
        if let Some(values) = witness.get_mut(column) {
            values[row] += FieldElement::from(delta);
        }
        prop_assert!(audit(spec, &witness).iter().any(|verdict| !verdict.passed()));

        let proof = prove(compiled, &mut witness, &ProverOptions::unchecked()).unwrap();
        prop_assert!(verify(compiled, &proof).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn mutated_counters_are_rejected_after_recursion(row in 0usize..8, delta in 1u64..1_000) {
        let compiled = &*RECURSED_COUNTER;
        let mut values = GOOD_COUNTER;
        values[row] += delta;
        let proof = prove(compiled, &mut counter_witness(&values), &ProverOptions::unchecked()).unwrap();
        prop_assert!(verify(compiled, &proof).is_err());
    }
}

#[test]
fn tampered_messages_are_rejected() {
    let (_, compiled) = &*COUNTER;
    let proof = prove(compiled, &mut counter_witness(&GOOD_COUNTER), &ProverOptions::default()).unwrap();
    let layout = ProofLayout::of(compiled);
    assert!(!layout.messages.is_empty());
    for index in 0..proof.messages.len() {
        if proof.messages[index].is_empty() {
            continue;
        }
        let mut tampered = proof.clone();
        tampered.messages[index][0] += FieldElement::ONE;
        let column = &compiled.columns().get(layout.messages[index]).unwrap().name;
        assert!(verify(compiled, &tampered).is_err(), "tampering with `{column}` went unnoticed");
    }
    for index in 0..proof.params.len() {
        let mut tampered = proof.clone();
        tampered.params[index].values[0] += FieldElement::ONE;
        assert!(verify(compiled, &tampered).is_err(), "tampered result {index} went unnoticed");
    }
}
