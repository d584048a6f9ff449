
use _fixtures::{catalogue_spec, catalogue_witness, init_tracing};
use rpp_wizard::field::FieldElement;
use rpp_wizard::proof::ProofLayout;
use rpp_wizard::verifier::VerificationFailure;
use rpp_wizard::{
    prove, verify, BuiltinProfile, CompilerParamsBuilder, Pipeline, Proof, ProverOptions, Specification,
};

fn compiled(blowup: u32) -> Specification {
    let params = CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST)
        .blowup(blowup)
        .build()
        .unwrap();
    Pipeline::commitment(params).compile(&catalogue_spec(8)).unwrap()
}

fn message_index(spec: &Specification, name: &str) -> usize {
    let id = spec.column_id(name).unwrap();
    ProofLayout::of(spec).messages.iter().position(|m| *m == id).unwrap()
}

fn honest(spec: &Specification) -> Proof {
    prove(spec, &mut catalogue_witness(8), &ProverOptions::default()).unwrap()
}

#[test]
fn every_blowup_round_trips() {
    init_tracing();
    for blowup in [2, 4, 8] {
        let spec = compiled(blowup);
        verify(&spec, &honest(&spec)).unwrap_or_else(|error| panic!("blowup {blowup}: {error}"));
    }
}

#[test]
fn corrupted_openings_fail_the_spot_checks() {
    let spec = compiled(4);
    let proof = honest(&spec);
    let opened = message_index(&spec, "VORTEX_0_OPENED");
    let mut tampered = proof.clone();
    tampered.messages[opened][0] += FieldElement::ONE;
    let error = verify(&spec, &tampered).unwrap_err();
    assert_eq!(error.query, "VORTEX_0");
    assert!(
        matches!(
            error.reason,
            VerificationFailure::LinearCombination { spot: 0 } | VerificationFailure::MerklePath { spot: 0, .. }
        ),
        "{error}"
    );
}

#[test]
fn corrupted_combined_row_is_rejected() {
    let spec = compiled(4);
    let proof = honest(&spec);
    let combined = message_index(&spec, "VORTEX_0_UALPHA");
    let mut tampered = proof.clone();
    let last = tampered.messages[combined].len() - 1;
    tampered.messages[combined][last] += FieldElement::ONE;
    let error = verify(&spec, &tampered).unwrap_err();
    assert!(
        matches!(
            error.reason,
            VerificationFailure::LinearCombination { .. }
                | VerificationFailure::MerklePath { .. }
                | VerificationFailure::CombinedClaim
        ),
        "{error}"
    );
}

#[test]
fn swapped_roots_are_rejected() {
    let spec = compiled(4);
    let mut proof = honest(&spec);
    let layout = ProofLayout::of(&spec);
    let roots: Vec<usize> = layout
        .digests
        .iter()
        .enumerate()
        .filter(|(_, id)| spec.slot(**id).unwrap().name.contains("_ROOT_"))
        .map(|(index, _)| index)
        .collect();
    assert!(!roots.is_empty());
    proof.digests[roots[0]][0].0[0] ^= 1;
    assert!(verify(&spec, &proof).is_err());
}

fn narrow(width: u32) -> Specification {
    let params = CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST)
        .matrix_width(width)
        .build()
        .unwrap();
    Pipeline::commitment(params).compile(&catalogue_spec(8)).unwrap()
}

#[test]
fn columns_wider_than_the_matrix_are_split() {
    init_tracing();
    let spec = narrow(4);
    let chunks = spec.column_id("VORTEX_0_CHUNKS").expect("split columns send their chunks");
    assert!(ProofLayout::of(&spec).messages.contains(&chunks));
    let combined = spec.columns().get(spec.column_id("VORTEX_0_UALPHA").unwrap()).unwrap();
    assert_eq!(combined.size, 4);
    verify(&spec, &honest(&spec)).unwrap();
}

#[test]
fn forged_chunk_evaluations_are_rejected() {
    let spec = narrow(4);
    let mut proof = honest(&spec);
    let chunks = message_index(&spec, "VORTEX_0_CHUNKS");
    proof.messages[chunks][1] += FieldElement::ONE;
    let error = verify(&spec, &proof).unwrap_err();
    assert_eq!(error.query, "VORTEX_0");
    assert!(matches!(error.reason, VerificationFailure::ChunkRecombination { .. }), "{error}");
}

#[test]
fn spot_check_count_follows_the_parameters() {
    let spec = Pipeline::commitment(
        CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST)
            .spot_checks(5)
            .build()
            .unwrap(),
    )
    .compile(&catalogue_spec(8))
    .unwrap();
    let spots = spec.coin_id("VORTEX_0_SPOTS").unwrap();
    match spec.coins().get(spots).unwrap().kind {
        rpp_wizard::iop::CoinKind::Integers { count, .. } => assert_eq!(count, 5),
        other => panic!("unexpected coin kind {other:?}"),
    }
}
