
use _fixtures::{
    counter_spec, counter_witness, fast_blake_params, fast_params, fast_recursive_params, init_tracing,
    BAD_COUNTER, GOOD_COUNTER,
};
use insta::assert_json_snapshot;
use rpp_wizard::compiler::dummy::audit;
use rpp_wizard::iop::QueryFailure;
use rpp_wizard::params::CompilerParams;
use rpp_wizard::verifier::{VerificationError, VerificationFailure};
use rpp_wizard::{prove, verify, AssignmentError, Pipeline, Proof, ProverOptions, Specification};

fn compile(pipeline: Pipeline) -> Specification {
    pipeline.compile(&counter_spec()).expect("counter compiles")
}

fn prove_counter(compiled: &Specification, values: &[u64], options: &ProverOptions) -> Proof {
    prove(compiled, &mut counter_witness(values), options).expect("proof")
}

fn reject_unchecked(compiled: &Specification) -> VerificationError {
    let proof = prove_counter(compiled, &BAD_COUNTER, &ProverOptions::unchecked());
    verify(compiled, &proof).expect_err("bad counter must be rejected")
}

fn assert_step_rejected(error: &VerificationError) {
    match &error.reason {
        VerificationFailure::GlobalIdentity { members } => {
            assert!(members.iter().any(|member| member == "counter-step"), "{error}");
        }
        other => panic!("unexpected rejection: {other}"),
    }
}

#[test]
fn dummy_pipeline_accepts_the_counter() {
    init_tracing();
    let compiled = compile(Pipeline::dummy(fast_params()));
    assert!(compiled.pending_queries().is_empty());
    let proof = prove_counter(&compiled, &GOOD_COUNTER, &ProverOptions::default());
    verify(&compiled, &proof).unwrap();
}

#[test]
fn audit_pinpoints_the_repeated_value() {
    let report = audit(&counter_spec(), &counter_witness(&BAD_COUNTER));
    assert_json_snapshot!("bad_counter_audit", report);
    assert!(audit(&counter_spec(), &counter_witness(&GOOD_COUNTER))
        .iter()
        .all(|verdict| verdict.passed()));
}

#[test]
fn dummy_verifier_names_the_violated_query() {
    let compiled = compile(Pipeline::dummy(fast_params()));
    let error = reject_unchecked(&compiled);
    assert_eq!(error.query, "counter-step");
    assert_eq!(
        error.reason,
        VerificationFailure::Query(QueryFailure::GlobalRow { row: 3 })
    );
}

#[test]
fn checked_prover_refuses_the_bad_counter() {
    let compiled = compile(Pipeline::commitment(fast_params()));
    let error = prove(&compiled, &mut counter_witness(&BAD_COUNTER), &ProverOptions::default()).unwrap_err();
    assert_eq!(
        error,
        AssignmentError::QueryViolated {
            query: "counter-step".into(),
            failure: QueryFailure::GlobalRow { row: 3 },
        }
    );
}

fn commitment_round_trip(params: CompilerParams) {
    init_tracing();
    let compiled = compile(Pipeline::commitment(params));
    assert!(compiled.pending_queries().is_empty());
    let proof = prove_counter(&compiled, &GOOD_COUNTER, &ProverOptions::default());
    verify(&compiled, &proof).unwrap();
    assert_step_rejected(&reject_unchecked(&compiled));
}

#[test]
fn commitment_pipeline_with_mimc_trees() {
    commitment_round_trip(fast_params());
}

#[test]
fn commitment_pipeline_with_blake2s_trees() {
    commitment_round_trip(fast_blake_params());
}

#[test]
fn self_recursive_pipeline_round_trip() {
    init_tracing();
    let compiled = compile(Pipeline::self_recursive(fast_recursive_params()));
    assert!(compiled.applied_passes().iter().any(|pass| pass == "self-recursion"));
    let proof = prove_counter(&compiled, &GOOD_COUNTER, &ProverOptions::default());
    verify(&compiled, &proof).unwrap();
    assert_step_rejected(&reject_unchecked(&compiled));
}
