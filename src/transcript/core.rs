use crate::field::{ExtElement, FieldElement};
use crate::hash::{Blake2sXof, Hasher};
use crate::merkle::Digest;

use super::types::{TranscriptError, TranscriptEvent, TranscriptLabel};

const TRANSCRIPT_VERSION_TAG: &[u8] = b"RPP-WIZARD-TRANSCRIPT-V1";

/// Deterministic, round-aware Fiat-Shamir transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    state: [u8; 32],
    round: usize,
    absorbed_in_round: bool,
    challenge_counter: u64,
    audit: Option<Vec<TranscriptEvent>>,
}

impl Transcript {
    /// Initialises the transcript for a compiled specification.
    pub fn new(fingerprint: &[u8; 32], params_hash: &[u8; 32]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(TRANSCRIPT_VERSION_TAG);
        let state = hasher.finalize().into_bytes();
        let mut setup = Vec::with_capacity(64);
        setup.extend_from_slice(fingerprint);
        setup.extend_from_slice(params_hash);
        Self {
            state: mix(state, TranscriptLabel::Setup, &setup),
            round: 0,
            absorbed_in_round: false,
            challenge_counter: 0,
            audit: None,
        }
    }

    /// Enables recording of every absorb/draw event.
    pub fn with_audit(mut self) -> Self {
        self.audit = Some(Vec::new());
        self
    }

    pub fn events(&self) -> Option<&[TranscriptEvent]> {
        self.audit.as_deref()
    }

    pub fn round(&self) -> usize {
        self.round
    }

    /// Closes the current round.
    pub fn advance(&mut self) -> usize {
        self.round += 1;
        self.absorbed_in_round = false;
        let round = self.round;
        self.record(move || TranscriptEvent::Advance { round });
        round
    }

    fn record(&mut self, event: impl FnOnce() -> TranscriptEvent) {
        if let Some(events) = self.audit.as_mut() {
            events.push(event());
        }
    }

    fn check_absorb(&mut self, round: usize) -> Result<(), TranscriptError> {
        if round != self.round {
            return Err(TranscriptError::RoundMismatch {
                expected: self.round,
                got: round,
            });
        }
        self.absorbed_in_round = true;
        Ok(())
    }

    fn absorb(&mut self, round: usize, label: TranscriptLabel, name: &str, data: &[u8]) -> Result<(), TranscriptError> {
        self.check_absorb(round)?;
        let mut payload = Vec::with_capacity(name.len() + data.len() + 8);
        payload.extend_from_slice(&(name.len() as u64).to_le_bytes());
        payload.extend_from_slice(name.as_bytes());
        payload.extend_from_slice(data);
        self.state = mix(self.state, label, &payload);
        let owned = name.to_owned();
        self.record(move || TranscriptEvent::Absorb {
            round,
            label,
            name: owned,
        });
        Ok(())
    }

    /// Absorbs canonical field elements.
    pub fn absorb_field_elements(
        &mut self,
        round: usize,
        label: TranscriptLabel,
        name: &str,
        values: &[FieldElement],
    ) -> Result<(), TranscriptError> {
        let mut buffer = Vec::with_capacity(values.len() * 8 + 8);
        buffer.extend_from_slice(&(values.len() as u64).to_le_bytes());
        for value in values {
            buffer.extend_from_slice(&value.0.to_le_bytes());
        }
        self.absorb(round, label, name, &buffer)
    }

    /// Absorbs a list of digests.
    pub fn absorb_digests(
        &mut self,
        round: usize,
        label: TranscriptLabel,
        name: &str,
        digests: &[Digest],
    ) -> Result<(), TranscriptError> {
        let mut buffer = Vec::with_capacity(digests.len() * 32 + 8);
        buffer.extend_from_slice(&(digests.len() as u64).to_le_bytes());
        for digest in digests {
            buffer.extend_from_slice(digest.as_bytes());
        }
        self.absorb(round, label, name, &buffer)
    }

    fn derive_challenge(&mut self, round: usize, name: &str, output: &mut [u8]) -> Result<(), TranscriptError> {
        if round != self.round {
            return Err(TranscriptError::RoundMismatch {
                expected: self.round,
                got: round,
            });
        }
        if self.absorbed_in_round {
            return Err(TranscriptError::LateChallenge { round });
        }
        self.challenge_counter = self.challenge_counter.wrapping_add(1);
        let label = TranscriptLabel::Coin;
        let mut seed = Vec::with_capacity(32 + 16 + 8 + name.len());
        seed.extend_from_slice(&self.state);
        seed.extend_from_slice(&label.domain_tag());
        seed.extend_from_slice(&self.challenge_counter.to_le_bytes());
        seed.extend_from_slice(name.as_bytes());
        let mut reader = Blake2sXof::new(&seed);
        reader.squeeze(output);
        self.state = mix(self.state, label, output);
        let owned = name.to_owned();
        self.record(move || TranscriptEvent::Draw { round, name: owned });
        Ok(())
    }

    /// Draws a field element coin.
    pub fn challenge_field(&mut self, round: usize, name: &str) -> Result<FieldElement, TranscriptError> {
        let mut bytes = [0u8; 32];
        self.derive_challenge(round, name, &mut bytes)?;
        Ok(FieldElement::from_transcript_bytes(&bytes))
    }

    /// Draws an extension field coin.
    pub fn challenge_ext(&mut self, round: usize, name: &str) -> Result<ExtElement, TranscriptError> {
        let mut bytes = [0u8; 64];
        self.derive_challenge(round, name, &mut bytes)?;
        let mut lo = [0u8; 32];
        let mut hi = [0u8; 32];
        lo.copy_from_slice(&bytes[..32]);
        hi.copy_from_slice(&bytes[32..]);
        Ok(ExtElement::new(
            FieldElement::from_transcript_bytes(&lo),
            FieldElement::from_transcript_bytes(&hi),
        ))
    }

    /// Draws `count` integers in `[0, bound)`.
    pub fn challenge_integers(
        &mut self,
        round: usize,
        name: &str,
        count: usize,
        bound: usize,
    ) -> Result<Vec<usize>, TranscriptError> {
        if bound == 0 {
            return Err(TranscriptError::RangeZero);
        }
        let mut bytes = vec![0u8; count * 8];
        self.derive_challenge(round, name, &mut bytes)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                (u64::from_le_bytes(word) % bound as u64) as usize
            })
            .collect())
    }

    /// Returns the digest of the current transcript state.
    pub fn state_digest(&self) -> [u8; 32] {
        self.state
    }
}

fn mix(state: [u8; 32], label: TranscriptLabel, data: &[u8]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(&state);
    hasher.update(&label.domain_tag());
    hasher.update(&(data.len() as u64).to_le_bytes());
    hasher.update(data);
    hasher.finalize().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Transcript {
        Transcript::new(&[1u8; 32], &[2u8; 32])
    }

    #[test]
    fn coins_depend_on_absorbed_data() {
        let mut a = fresh();
        let mut b = fresh();
        a.absorb_field_elements(0, TranscriptLabel::Message, "c", &[FieldElement::ONE])
            .unwrap();
        b.absorb_field_elements(0, TranscriptLabel::Message, "c", &[FieldElement::ZERO])
            .unwrap();
        a.advance();
        b.advance();
        assert_ne!(
            a.challenge_field(1, "alpha").unwrap(),
            b.challenge_field(1, "alpha").unwrap()
        );
    }

    #[test]
    fn late_challenge_is_rejected() {
        let mut t = fresh();
        t.challenge_field(0, "early").unwrap();
        t.absorb_field_elements(0, TranscriptLabel::Message, "c", &[FieldElement::ONE])
            .unwrap();
        assert_eq!(
            t.challenge_field(0, "late"),
            Err(TranscriptError::LateChallenge { round: 0 })
        );
    }

    #[test]
    fn absorbing_a_future_round_is_rejected() {
        let mut t = fresh();
        assert_eq!(
            t.absorb_field_elements(1, TranscriptLabel::Message, "c", &[]),
            Err(TranscriptError::RoundMismatch {
                expected: 0,
                got: 1
            })
        );
    }

    #[test]
    fn integer_coins_respect_bound() {
        let mut t = fresh();
        let values = t.challenge_integers(0, "q", 64, 10).unwrap();
        assert!(values.iter().all(|v| *v < 10));
        assert_eq!(t.challenge_integers(0, "q2", 1, 0), Err(TranscriptError::RangeZero));
    }
}
