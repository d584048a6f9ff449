
use _fixtures::{
    catalogue_spec, catalogue_witness, fast_blake_params, fast_params, fast_recursive_params, init_tracing,
    interactive_spec, interactive_witness,
};
use rpp_wizard::compiler::dummy::audit;
use rpp_wizard::iop::QueryStatus;
use rpp_wizard::params::CompilerParams;
use rpp_wizard::{prove, verify, Pipeline, ProverOptions, Specification};

fn pipelines() -> Vec<(&'static str, Pipeline)> {
    vec![
        ("dummy", Pipeline::dummy(fast_params())),
        ("commitment-mimc", Pipeline::commitment(fast_params())),
        ("commitment-blake2s", Pipeline::commitment(fast_blake_params())),
        ("self-recursive", Pipeline::self_recursive(fast_recursive_params())),
    ]
}

fn every_query_compiled(compiled: &Specification) {
    for (_, info) in compiled.queries().iter() {
        assert!(
            matches!(info.status, QueryStatus::Compiled { .. }),
            "query `{}` left pending",
            info.name
        );
    }
}

#[test]
fn catalogue_is_accepted_by_every_pipeline() {
    init_tracing();
    let spec = catalogue_spec(8);
    assert!(audit(&spec, &catalogue_witness(8)).iter().all(|verdict| verdict.passed()));
    for (label, pipeline) in pipelines() {
        let compiled = pipeline.compile(&spec).unwrap_or_else(|error| panic!("{label}: {error}"));
        every_query_compiled(&compiled);
        let proof = prove(&compiled, &mut catalogue_witness(8), &ProverOptions::default())
            .unwrap_or_else(|error| panic!("{label}: {error}"));
        verify(&compiled, &proof).unwrap_or_else(|error| panic!("{label}: {error}"));
    }
}

#[test]
fn coins_drive_later_witness_rounds() {
    init_tracing();
    let spec = interactive_spec();
    for (label, pipeline) in pipelines() {
        let compiled = pipeline.compile(&spec).unwrap_or_else(|error| panic!("{label}: {error}"));
        let proof = prove(&compiled, &mut interactive_witness(), &ProverOptions::default())
            .unwrap_or_else(|error| panic!("{label}: {error}"));
        verify(&compiled, &proof).unwrap_or_else(|error| panic!("{label}: {error}"));
    }
}

#[test]
fn larger_tables_under_a_matrix_width_cap() {
    let params: CompilerParams = rpp_wizard::CompilerParamsBuilder::from_profile(rpp_wizard::BuiltinProfile::TEST_FAST)
        .matrix_width(64)
        .build()
        .unwrap();
    let spec = catalogue_spec(32);
    let compiled = Pipeline::commitment(params).compile(&spec).unwrap();
    let proof = prove(&compiled, &mut catalogue_witness(32), &ProverOptions::default().sequential()).unwrap();
    verify(&compiled, &proof).unwrap();
}

#[test]
fn compiling_leaves_the_input_untouched() {
    let spec = catalogue_spec(8);
    let before = spec.fingerprint();
    let compiled = Pipeline::commitment(fast_params()).compile(&spec).unwrap();
    assert_eq!(spec.fingerprint(), before);
    assert!(spec.applied_passes().is_empty());
    assert_eq!(spec.pending_queries().len(), spec.queries().len());
    assert!(compiled.num_rounds() > spec.num_rounds());
    assert_eq!(compiled.frozen_rounds(), spec.frozen_rounds());
}
