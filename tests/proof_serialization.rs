
use _fixtures::{counter_spec, counter_witness, fast_params, fast_recursive_params, GOOD_COUNTER};
use proptest::prelude::*;
use rpp_wizard::proof::{ProofLayout, PROOF_VERSION};
use rpp_wizard::ser::SerError;
use rpp_wizard::{deserialize_proof, prove, serialize_proof, verify, Pipeline, Proof, ProverOptions, Specification};

fn compiled_and_proof(pipeline: Pipeline) -> (Specification, Proof) {
    let compiled = pipeline.compile(&counter_spec()).unwrap();
    let proof = prove(&compiled, &mut counter_witness(&GOOD_COUNTER), &ProverOptions::default()).unwrap();
    (compiled, proof)
}

#[test]
fn decoded_proofs_still_verify() {
    for pipeline in [
        Pipeline::dummy(fast_params()),
        Pipeline::commitment(fast_params()),
        Pipeline::self_recursive(fast_recursive_params()),
    ] {
        let (compiled, proof) = compiled_and_proof(pipeline);
        let bytes = serialize_proof(&proof).unwrap();
        assert_eq!(bytes.len(), ProofLayout::of(&compiled).encoded_len(&compiled));
        let decoded = deserialize_proof(bytes.as_slice()).unwrap();
        assert_eq!(decoded, proof);
        verify(&compiled, &decoded).unwrap();
        assert_eq!(Proof::from_bytes(proof.to_bytes().unwrap().as_slice()).unwrap(), proof);
    }
}

#[test]
fn unknown_versions_are_refused() {
    let (_, proof) = compiled_and_proof(Pipeline::commitment(fast_params()));
    let mut bytes = serialize_proof(&proof).unwrap().into_vec();
    bytes[0] = PROOF_VERSION + 1;
    assert!(matches!(deserialize_proof(&bytes), Err(SerError::InvalidValue { .. })));
}

#[test]
fn proofs_are_bound_to_their_specification() {
    let (_, proof) = compiled_and_proof(Pipeline::commitment(fast_params()));
    let other = Pipeline::dummy(fast_params()).compile(&counter_spec()).unwrap();
    let error = verify(&other, &proof).unwrap_err();
    assert_eq!(error.query, "proof");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn flipped_bytes_never_verify(position in any::<prop::sample::Index>(), mask in 1u8..=255) {
        let (compiled, proof) = compiled_and_proof(Pipeline::commitment(fast_params()));
        let mut bytes = serialize_proof(&proof).unwrap().into_vec();
        let position = position.index(bytes.len());
        bytes[position] ^= mask;
        if let Ok(decoded) = deserialize_proof(&bytes) {
            prop_assert!(verify(&compiled, &decoded).is_err());
        }
    }
}
