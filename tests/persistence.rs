
use _fixtures::{
    catalogue_spec, catalogue_witness, counter_spec, counter_witness, fast_params, fast_recursive_params,
    GOOD_COUNTER,
};
use rpp_wizard::iop::persist::{load, save};
use rpp_wizard::iop::PersistError;
use rpp_wizard::{prove, verify, Pipeline, ProverOptions};

#[test]
fn reloaded_recursive_specification_proves_and_verifies() {
    let compiled = Pipeline::self_recursive(fast_recursive_params())
        .compile(&counter_spec())
        .unwrap();
    let json = save(&compiled).unwrap();
    let reloaded = load(&json).unwrap();
    assert_eq!(reloaded.fingerprint(), compiled.fingerprint());
    assert_eq!(reloaded.applied_passes(), compiled.applied_passes());

    let proof = prove(&reloaded, &mut counter_witness(&GOOD_COUNTER), &ProverOptions::default()).unwrap();
    verify(&compiled, &proof).unwrap();
    let proof = prove(&compiled, &mut counter_witness(&GOOD_COUNTER), &ProverOptions::default()).unwrap();
    verify(&reloaded, &proof).unwrap();
}

#[test]
fn saving_twice_gives_the_same_document() {
    let compiled = Pipeline::commitment(fast_params()).compile(&catalogue_spec(8)).unwrap();
    let first = save(&compiled).unwrap();
    let second = save(&load(&first).unwrap()).unwrap();
    assert_eq!(first, second);

    let reloaded = load(&first).unwrap();
    let proof = prove(&reloaded, &mut catalogue_witness(8), &ProverOptions::default()).unwrap();
    verify(&compiled, &proof).unwrap();
}

#[test]
fn uncompiled_specifications_persist_too() {
    let spec = counter_spec();
    let reloaded = load(&save(&spec).unwrap()).unwrap();
    assert_eq!(reloaded.fingerprint(), spec.fingerprint());
    assert_eq!(reloaded.frozen_rounds(), spec.frozen_rounds());
    assert_eq!(reloaded.pending_queries(), spec.pending_queries());
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(matches!(load("{"), Err(PersistError::Json(_))));
    let json = save(&counter_spec()).unwrap();
    let truncated = &json[..json.len() / 2];
    assert!(load(truncated).is_err());
}
