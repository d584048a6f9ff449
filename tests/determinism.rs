
use _fixtures::{
    catalogue_spec, catalogue_witness, counter_spec, counter_witness, fast_params, fast_recursive_params,
    interactive_spec, interactive_witness, GOOD_COUNTER,
};
use rpp_wizard::prover::prove_audited;
use rpp_wizard::verifier::verify_audited;
use rpp_wizard::{prove, serialize_proof, Pipeline, ProverOptions};

#[test]
fn identical_inputs_give_identical_bytes() {
    let compiled = Pipeline::commitment(fast_params()).compile(&catalogue_spec(8)).unwrap();
    let first = prove(&compiled, &mut catalogue_witness(8), &ProverOptions::default()).unwrap();
    let second = prove(&compiled, &mut catalogue_witness(8), &ProverOptions::default()).unwrap();
    assert_eq!(
        serialize_proof(&first).unwrap().as_slice(),
        serialize_proof(&second).unwrap().as_slice()
    );
}

#[test]
fn compilation_is_deterministic() {
    let pipeline = Pipeline::self_recursive(fast_recursive_params());
    let first = pipeline.compile(&counter_spec()).unwrap();
    let second = pipeline.compile(&counter_spec()).unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn parallelism_does_not_change_the_proof() {
    let compiled = Pipeline::self_recursive(fast_recursive_params())
        .compile(&counter_spec())
        .unwrap();
    let parallel = prove(&compiled, &mut counter_witness(&GOOD_COUNTER), &ProverOptions::default()).unwrap();
    let sequential = prove(
        &compiled,
        &mut counter_witness(&GOOD_COUNTER),
        &ProverOptions::default().sequential(),
    )
    .unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn verifier_replays_the_prover_transcript() {
    let compiled = Pipeline::commitment(fast_params()).compile(&interactive_spec()).unwrap();
    let (proof, prover_events) =
        prove_audited(&compiled, &mut interactive_witness(), &ProverOptions::default()).unwrap();
    let verifier_events = verify_audited(&compiled, &proof).unwrap();
    assert!(!prover_events.is_empty());
    assert_eq!(prover_events, verifier_events);
}

#[test]
fn different_parameters_bind_different_transcripts() {
    let spec = counter_spec();
    let fast = Pipeline::commitment(fast_params()).compile(&spec).unwrap();
    let wider = Pipeline::commitment(
        rpp_wizard::CompilerParamsBuilder::from_profile(rpp_wizard::BuiltinProfile::TEST_FAST)
            .spot_checks(9)
            .build()
            .unwrap(),
    )
    .compile(&spec)
    .unwrap();
    assert_ne!(fast.params_hash(), wider.params_hash());
    let proof = prove(&fast, &mut counter_witness(&GOOD_COUNTER), &ProverOptions::default()).unwrap();
    assert!(rpp_wizard::verify(&wider, &proof).is_err());
}
