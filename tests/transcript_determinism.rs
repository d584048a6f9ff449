use insta::assert_json_snapshot;
use proptest::prelude::*;
use rpp_wizard::field::FieldElement;
use rpp_wizard::merkle::Digest;
use rpp_wizard::params::{BuiltinProfile, CompilerParamsBuilder};
use rpp_wizard::transcript::{Transcript, TranscriptError, TranscriptLabel};

fn params_hash(profile: BuiltinProfile) -> [u8; 32] {
    CompilerParamsBuilder::from_profile(profile)
        .build()
        .expect("profile must be valid")
        .params_hash()
}

fn fresh(profile: BuiltinProfile) -> Transcript {
    Transcript::new(&[7u8; 32], &params_hash(profile)).with_audit()
}

/// Two rounds: a message and a root in round 0, two coins and a query
/// result in round 1, spot positions in round 2.
fn run(t: &mut Transcript, message: &[FieldElement]) -> (FieldElement, FieldElement, Vec<usize>) {
    t.absorb_field_elements(0, TranscriptLabel::Message, "x", message)
        .unwrap();
    t.absorb_digests(0, TranscriptLabel::Digest, "root", &[Digest([3u8; 32])])
        .unwrap();
    t.advance();
    let alpha = t.challenge_field(1, "alpha").unwrap();
    let beta = t.challenge_field(1, "beta").unwrap();
    t.absorb_field_elements(1, TranscriptLabel::QueryParams, "eval", &[alpha * beta])
        .unwrap();
    t.advance();
    let spots = t.challenge_integers(2, "spots", 8, 64).unwrap();
    (alpha, beta, spots)
}

#[test]
fn deterministic_state_digest() {
    let message = [FieldElement::from(5u64), FieldElement::from(9u64)];
    let mut t1 = fresh(BuiltinProfile::TEST_FAST);
    let mut t2 = fresh(BuiltinProfile::TEST_FAST);
    assert_eq!(run(&mut t1, &message), run(&mut t2, &message));
    assert_eq!(t1.state_digest(), t2.state_digest());
    assert_eq!(t1.events(), t2.events());
}

#[test]
fn params_and_fingerprint_bind_the_coins() {
    let message = [FieldElement::ONE];
    let mut base = fresh(BuiltinProfile::TEST_FAST);
    let mut other_params = fresh(BuiltinProfile::COMPACT_X4);
    let mut other_spec = Transcript::new(&[8u8; 32], &params_hash(BuiltinProfile::TEST_FAST));
    let expected = run(&mut base, &message);
    assert_ne!(expected.0, run(&mut other_params, &message).0);
    assert_ne!(expected.0, run(&mut other_spec, &message).0);
}

#[test]
fn labels_and_names_are_separated() {
    let values = [FieldElement::from(42u64)];
    let mut message = Transcript::new(&[0u8; 32], &[0u8; 32]);
    let mut params = Transcript::new(&[0u8; 32], &[0u8; 32]);
    let mut renamed = Transcript::new(&[0u8; 32], &[0u8; 32]);
    message
        .absorb_field_elements(0, TranscriptLabel::Message, "c", &values)
        .unwrap();
    params
        .absorb_field_elements(0, TranscriptLabel::QueryParams, "c", &values)
        .unwrap();
    renamed
        .absorb_field_elements(0, TranscriptLabel::Message, "d", &values)
        .unwrap();
    assert_ne!(message.state_digest(), params.state_digest());
    assert_ne!(message.state_digest(), renamed.state_digest());
}

#[test]
fn out_of_order_operations_fail() {
    let mut t = fresh(BuiltinProfile::TEST_FAST);
    t.absorb_field_elements(0, TranscriptLabel::Message, "x", &[FieldElement::ONE])
        .unwrap();
    assert_eq!(
        t.challenge_field(0, "late"),
        Err(TranscriptError::LateChallenge { round: 0 })
    );
    assert_eq!(
        t.challenge_field(1, "early"),
        Err(TranscriptError::RoundMismatch { expected: 0, got: 1 })
    );
    t.advance();
    assert_eq!(
        t.absorb_digests(0, TranscriptLabel::Digest, "stale", &[]),
        Err(TranscriptError::RoundMismatch { expected: 1, got: 0 })
    );
    assert!(t.challenge_ext(1, "gamma").is_ok());
}

#[test]
fn snapshot_audit_trail() {
    let mut t = fresh(BuiltinProfile::TEST_FAST);
    run(&mut t, &[FieldElement::ZERO]);
    assert_json_snapshot!("audit_trail", t.events().unwrap());
}

proptest! {
    #[test]
    fn prop_message_changes_coins(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        prop_assume!(a != b);
        let mut t1 = fresh(BuiltinProfile::TEST_FAST);
        let mut t2 = fresh(BuiltinProfile::TEST_FAST);
        let first = run(&mut t1, &[FieldElement::from(a)]);
        let second = run(&mut t2, &[FieldElement::from(b)]);
        prop_assert_ne!(first.0, second.0);
        prop_assert_ne!(t1.state_digest(), t2.state_digest());
    }

    #[test]
    fn prop_integer_coins_stay_in_range(count in 1usize..64, bound in 1usize..1_000) {
        let mut t = fresh(BuiltinProfile::TEST_FAST);
        let values = t.challenge_integers(0, "q", count, bound).unwrap();
        prop_assert_eq!(values.len(), count);
        prop_assert!(values.iter().all(|v| *v < bound));
    }
}
