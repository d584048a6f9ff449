use std::sync::Arc;

use tracing::debug;

use super::errors::VerificationError;
use crate::field::FieldElement;
use crate::iop::check::{materialize_verifier_column, Assignment};
use crate::iop::coin::draw;
use crate::iop::specification::RoundItem;
use crate::iop::{CoinId, CoinValue, ColumnId, QueryFailure, QueryId, QueryParams, SlotId, Specification};
use crate::merkle::Digest;
use crate::proof::{Proof, ProofLayout, PROOF_VERSION};
use crate::transcript::{Transcript, TranscriptEvent, TranscriptLabel};

/// Everything the verifier knows while replaying a proof: public columns,
/// replayed coins and the values carried by the proof.
pub struct VerifierRuntime<'a> {
    spec: &'a Specification,
    round: usize,
    columns: Vec<Option<Arc<Vec<FieldElement>>>>,
    commitments: Vec<Option<Digest>>,
    coins: Vec<Option<CoinValue>>,
    params: Vec<Option<QueryParams>>,
    digests: Vec<Option<Vec<Digest>>>,
    transcript: Transcript,
}

impl<'a> VerifierRuntime<'a> {
    /// Checks the proof shape against the layout of `spec` and loads it.
    pub(crate) fn load(spec: &'a Specification, proof: &Proof, audit: bool) -> Result<Self, VerificationError> {
        if proof.version != PROOF_VERSION {
            return Err(VerificationError::malformed(
                "proof",
                format!("unsupported version {}", proof.version),
            ));
        }
        let fingerprint = spec.fingerprint();
        if proof.spec_digest != Digest(fingerprint) {
            return Err(VerificationError::malformed(
                "proof",
                "proof was produced for another specification",
            ));
        }

        let layout = ProofLayout::of(spec);
        let count = |what: &str, expected: usize, got: usize| {
            if expected == got {
                Ok(())
            } else {
                Err(VerificationError::malformed(
                    "proof",
                    format!("expected {expected} {what}, found {got}"),
                ))
            }
        };
        count("column commitments", layout.commitments.len(), proof.column_commitments.len())?;
        count("messages", layout.messages.len(), proof.messages.len())?;
        count("digest slots", layout.digests.len(), proof.digests.len())?;
        count("query results", layout.params.len(), proof.params.len())?;

        let mut columns = vec![None; spec.columns().len()];
        for (id, values) in &spec.precomputed {
            columns[id.index()] = Some(Arc::clone(values));
        }
        let mut commitments = vec![None; spec.columns().len()];
        for (id, digest) in layout.commitments.iter().zip(&proof.column_commitments) {
            commitments[id.index()] = Some(*digest);
        }
        for (id, values) in layout.messages.iter().zip(&proof.messages) {
            let info = spec.columns().info(*id);
            if values.len() != info.size {
                return Err(VerificationError::malformed(
                    info.name.clone(),
                    format!("message holds {} values, column size is {}", values.len(), info.size),
                ));
            }
            columns[id.index()] = Some(Arc::new(values.clone()));
        }
        let mut digests = vec![None; spec.slots().len()];
        for (slot, values) in layout.digests.iter().zip(&proof.digests) {
            let info = &spec.slots()[slot.index()];
            if values.len() != info.count {
                return Err(VerificationError::malformed(
                    info.name.clone(),
                    format!("slot holds {} digests, expected {}", values.len(), info.count),
                ));
            }
            digests[slot.index()] = Some(values.clone());
        }
        let mut params = vec![None; spec.queries().len()];
        for (id, values) in layout.params.iter().zip(&proof.params) {
            let info = spec.queries().info(*id);
            let expected = info.query.result_len().unwrap_or(0);
            if values.values.len() != expected {
                return Err(VerificationError::malformed(
                    info.name.clone(),
                    format!("{} results claimed, query yields {expected}", values.values.len()),
                ));
            }
            params[id.index()] = Some(values.clone());
        }

        let mut transcript = Transcript::new(&fingerprint, spec.params_hash());
        if audit {
            transcript = transcript.with_audit();
        }
        Ok(Self {
            spec,
            round: 0,
            columns,
            commitments,
            coins: vec![None; spec.coins().len()],
            params,
            digests,
            transcript,
        })
    }

    pub fn spec(&self) -> &'a Specification {
        self.spec
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn column(&self, id: ColumnId) -> Option<&[FieldElement]> {
        Assignment::column(self, id)
    }

    pub fn coin(&self, id: CoinId) -> Option<&CoinValue> {
        self.coins.get(id.index()).and_then(Option::as_ref)
    }

    pub fn params(&self, id: QueryId) -> Option<&QueryParams> {
        self.params.get(id.index()).and_then(Option::as_ref)
    }

    pub fn slot_digests(&self, slot: SlotId) -> Option<&[Digest]> {
        self.digests.get(slot.index()).and_then(|digests| digests.as_deref())
    }

    /// Replays the coins of `round` and builds its verifier-defined columns.
    pub(crate) fn begin_round(&mut self, round: usize) -> Result<(), VerificationError> {
        if round > 0 {
            self.transcript.advance();
        }
        self.round = round;
        let spec = self.spec;
        for (id, info) in spec.coins().in_round(round) {
            let value = draw(&mut self.transcript, round, info)
                .map_err(|error| VerificationError::new(info.name.clone(), error))?;
            self.coins[id.index()] = Some(value);
        }
        for (id, recipe) in &spec.verifier_columns {
            let info = spec.columns().info(*id);
            if info.round != round {
                continue;
            }
            let values = materialize_verifier_column(spec, *id, recipe, &*self)
                .map_err(|failure| VerificationError::new(info.name.clone(), failure))?;
            self.columns[id.index()] = Some(Arc::new(values));
        }
        Ok(())
    }

    /// Absorbs the round payload exactly as the prover did.
    pub(crate) fn absorb_round(&mut self) -> Result<(), VerificationError> {
        let round = self.round;
        let spec = self.spec;
        for item in spec.round_items(round) {
            match item {
                RoundItem::Commitment(id) => {
                    let name = &spec.columns().info(id).name;
                    let digest = self.commitments[id.index()]
                        .ok_or_else(|| VerificationError::malformed(name.clone(), "missing commitment"))?;
                    self.transcript
                        .absorb_digests(round, TranscriptLabel::ColumnCommitment, name, &[digest])
                        .map_err(|error| VerificationError::new(name.clone(), error))?;
                }
                RoundItem::Message(id) => {
                    let name = &spec.columns().info(id).name;
                    let values = self.columns[id.index()]
                        .clone()
                        .ok_or_else(|| VerificationError::malformed(name.clone(), "missing message"))?;
                    self.transcript
                        .absorb_field_elements(round, TranscriptLabel::Message, name, &values)
                        .map_err(|error| VerificationError::new(name.clone(), error))?;
                }
                RoundItem::Digests(slot) => {
                    let name = spec.slots()[slot.index()].name.clone();
                    let digests = self
                        .slot_digests(slot)
                        .ok_or_else(|| VerificationError::malformed(name.clone(), "missing digests"))?
                        .to_vec();
                    self.transcript
                        .absorb_digests(round, TranscriptLabel::Digest, &name, &digests)
                        .map_err(|error| VerificationError::new(name, error))?;
                }
                RoundItem::Params(id) => {
                    let name = &spec.queries().info(id).name;
                    let values = self
                        .params(id)
                        .ok_or_else(|| VerificationError::malformed(name.clone(), "missing query result"))?
                        .values
                        .clone();
                    self.transcript
                        .absorb_field_elements(round, TranscriptLabel::QueryParams, name, &values)
                        .map_err(|error| VerificationError::new(name.clone(), error))?;
                }
            }
        }
        debug!(round, "round replayed");
        Ok(())
    }

    pub(crate) fn into_events(self) -> Vec<TranscriptEvent> {
        self.transcript.events().map(<[TranscriptEvent]>::to_vec).unwrap_or_default()
    }

    /// Values of a column the verifier can read, attributed to `query`.
    pub(crate) fn read_column(&self, query: &str, id: ColumnId) -> Result<&[FieldElement], VerificationError> {
        self.column(id).ok_or_else(|| {
            VerificationError::new(
                query,
                QueryFailure::MissingColumn(self.spec.columns().info(id).name.clone()),
            )
        })
    }

    pub(crate) fn read_field_coin(&self, query: &str, id: CoinId) -> Result<FieldElement, VerificationError> {
        crate::iop::check::field_coin(self.spec, self, id).map_err(|failure| VerificationError::new(query, failure))
    }

    pub(crate) fn read_integer_coin(&self, query: &str, id: CoinId) -> Result<&[usize], VerificationError> {
        let name = || self.spec.coins().info(id).name.clone();
        self.coin(id)
            .ok_or_else(|| VerificationError::new(query, QueryFailure::MissingCoin(name())))?
            .as_integers()
            .ok_or_else(|| VerificationError::new(query, QueryFailure::CoinKind(name())))
    }

    /// Result `index` of a result query.
    pub(crate) fn read_param(&self, query: &str, id: QueryId, index: usize) -> Result<FieldElement, VerificationError> {
        self.params(id)
            .and_then(|params| params.values.get(index).copied())
            .ok_or_else(|| VerificationError::new(query, QueryFailure::MissingParams))
    }
}

impl Assignment for VerifierRuntime<'_> {
    fn column(&self, id: ColumnId) -> Option<&[FieldElement]> {
        self.columns.get(id.index()).and_then(|slot| slot.as_deref()).map(Vec::as_slice)
    }

    fn coin(&self, id: CoinId) -> Option<&CoinValue> {
        self.coins.get(id.index()).and_then(Option::as_ref)
    }

    fn params(&self, id: QueryId) -> Option<&QueryParams> {
        self.params.get(id.index()).and_then(Option::as_ref)
    }

    fn digests(&self, slot: SlotId) -> Option<&[Digest]> {
        self.digests.get(slot.index()).and_then(|digests| digests.as_deref())
    }
}
