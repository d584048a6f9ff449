use proptest::prelude::*;
use rpp_wizard::fft::{decode, encode, extend, CodecError, Radix2Domain};
use rpp_wizard::field::polynomial::lagrange_evaluate;
use rpp_wizard::field::FieldElement;

fn arb_felt() -> impl Strategy<Value = FieldElement> {
    any::<u64>().prop_map(FieldElement::from)
}

fn arb_message() -> impl Strategy<Value = Vec<FieldElement>> {
    (0usize..=6).prop_flat_map(|log| prop::collection::vec(arb_felt(), 1 << log))
}

fn arb_blowup() -> impl Strategy<Value = usize> {
    prop::sample::select(vec![2usize, 4, 8])
}

proptest! {
    #[test]
    fn decoding_recovers_the_message(message in arb_message(), blowup in arb_blowup()) {
        let codeword = encode(&message, blowup).unwrap();
        prop_assert_eq!(codeword.len(), message.len() * blowup);
        prop_assert_eq!(decode(&codeword, blowup).unwrap(), message);
    }

    #[test]
    fn message_sits_on_every_blowup_th_symbol(message in arb_message(), blowup in arb_blowup()) {
        let codeword = encode(&message, blowup).unwrap();
        for (index, value) in message.iter().enumerate() {
            prop_assert_eq!(codeword[index * blowup], *value);
        }
    }

    #[test]
    fn one_corrupted_symbol_is_detected(
        message in arb_message(),
        blowup in arb_blowup(),
        position in any::<prop::sample::Index>(),
        delta in 1u64..u32::MAX as u64,
    ) {
        let mut codeword = encode(&message, blowup).unwrap();
        let position = position.index(codeword.len());
        codeword[position] += FieldElement::from(delta);
        let is_not_a_codeword = matches!(decode(&codeword, blowup), Err(CodecError::NotACodeword { .. }));
        prop_assert!(is_not_a_codeword);
    }

    #[test]
    fn extension_preserves_evaluations(message in arb_message(), point in arb_felt()) {
        let extended = extend(&message, message.len() * 4).unwrap();
        prop_assert_eq!(lagrange_evaluate(&extended, point), lagrange_evaluate(&message, point));
    }

    #[test]
    fn fft_and_ifft_are_inverse(values in arb_message()) {
        let domain = Radix2Domain::new(values.len()).unwrap();
        let mut work = values.clone();
        domain.ifft(&mut work).unwrap();
        domain.fft(&mut work).unwrap();
        prop_assert_eq!(work, values);
    }
}

#[test]
fn blowups_must_be_powers_of_two_above_one() {
    let message = vec![FieldElement::ONE; 4];
    for blowup in [0usize, 1, 3, 6] {
        assert_eq!(encode(&message, blowup), Err(CodecError::InvalidBlowup { blowup }));
    }
}

#[test]
fn truncated_codewords_are_rejected() {
    let codeword = encode(&[FieldElement::ONE; 4], 4).unwrap();
    assert!(matches!(
        decode(&codeword[..7], 4),
        Err(CodecError::InvalidLength { len: 7, blowup: 4 })
    ));
}
