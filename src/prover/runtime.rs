use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::errors::AssignmentError;
use super::options::ProverOptions;
use crate::compiler::vortex::CommittedMatrix;
use crate::field::FieldElement;
use crate::hash::hash_field_elements;
use crate::iop::check::{check_query, compute_params, materialize_verifier_column, Assignment};
use crate::iop::coin::draw;
use crate::iop::specification::RoundItem;
use crate::iop::{CoinId, CoinValue, ColumnId, ColumnKind, ColumnOrigin, QueryId, QueryParams, SlotId, Specification};
use crate::merkle::Digest;
use crate::proof::{Proof, ProofLayout, PROOF_VERSION};
use crate::transcript::{Transcript, TranscriptEvent, TranscriptLabel};

const COLUMN_COMMITMENT_DOMAIN: &[u8] = b"RPP-WIZARD-COLUMN";

/// Hash commitment of a column that no vector commitment took over.
fn column_commitment(values: &[FieldElement]) -> Digest {
    Digest(hash_field_elements(COLUMN_COMMITMENT_DOMAIN, values).into_bytes())
}

/// State of one proof attempt. Owned by a single `prove` call.
pub struct ProverRuntime<'a> {
    spec: &'a Specification,
    parallel: bool,
    check_witness: bool,
    round: usize,
    columns: Vec<Option<Arc<Vec<FieldElement>>>>,
    coins: Vec<Option<CoinValue>>,
    params: Vec<Option<QueryParams>>,
    digests: Vec<Option<Vec<Digest>>>,
    commitments: BTreeMap<ColumnId, Digest>,
    pub(crate) matrices: BTreeMap<(usize, usize), CommittedMatrix>,
    transcript: Transcript,
}

impl<'a> ProverRuntime<'a> {
    pub(crate) fn new(spec: &'a Specification, options: &ProverOptions, audit: bool) -> Self {
        let mut transcript = Transcript::new(&spec.fingerprint(), spec.params_hash());
        if audit {
            transcript = transcript.with_audit();
        }
        let mut columns = vec![None; spec.columns().len()];
        for (id, values) in &spec.precomputed {
            columns[id.index()] = Some(Arc::clone(values));
        }
        Self {
            spec,
            parallel: options.parallel,
            check_witness: options.check_witness,
            round: 0,
            columns,
            coins: vec![None; spec.coins().len()],
            params: vec![None; spec.queries().len()],
            digests: vec![None; spec.slots().len()],
            commitments: BTreeMap::new(),
            matrices: BTreeMap::new(),
            transcript,
        }
    }

    pub fn spec(&self) -> &'a Specification {
        self.spec
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Whether the run fails closed on unsatisfied queries.
    pub fn checks_witness(&self) -> bool {
        self.check_witness
    }

    pub fn is_assigned(&self, id: ColumnId) -> bool {
        self.columns.get(id.index()).map_or(false, Option::is_some)
    }

    pub fn column(&self, id: ColumnId) -> Result<&[FieldElement], AssignmentError> {
        self.columns
            .get(id.index())
            .and_then(|slot| slot.as_deref())
            .map(Vec::as_slice)
            .ok_or_else(|| AssignmentError::MissingColumn {
                name: self.column_name(id),
                round: self.round,
            })
    }

    pub fn coin(&self, id: CoinId) -> Result<&CoinValue, AssignmentError> {
        self.coins
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| AssignmentError::MissingCoin {
                name: self.spec.coins().get(id).map(|info| info.name.clone()).unwrap_or_default(),
            })
    }

    pub fn field_coin(&self, id: CoinId) -> Result<FieldElement, AssignmentError> {
        let value = self.coin(id)?;
        value.as_field().ok_or_else(|| AssignmentError::MissingCoin {
            name: self.spec.coins().info(id).name.clone(),
        })
    }

    pub fn integer_coin(&self, id: CoinId) -> Result<&[usize], AssignmentError> {
        let value = self.coin(id)?;
        value.as_integers().ok_or_else(|| AssignmentError::MissingCoin {
            name: self.spec.coins().info(id).name.clone(),
        })
    }

    pub fn query_params(&self, id: QueryId) -> Result<&QueryParams, AssignmentError> {
        self.params
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| AssignmentError::MissingParams {
                name: self.spec.queries().info(id).name.clone(),
            })
    }

    pub fn slot_digests(&self, slot: SlotId) -> Result<&[Digest], AssignmentError> {
        self.digests
            .get(slot.index())
            .and_then(|digests| digests.as_deref())
            .ok_or_else(|| AssignmentError::MissingDigests {
                name: self.spec.slot(slot).map(|slot| slot.name.clone()).unwrap_or_default(),
            })
    }

    fn column_name(&self, id: ColumnId) -> String {
        self.spec.columns().get(id).map(|info| info.name.clone()).unwrap_or_default()
    }

    fn store(&mut self, id: ColumnId, values: Vec<FieldElement>) -> Result<(), AssignmentError> {
        let info = self.spec.columns().info(id);
        if values.len() != info.size {
            return Err(AssignmentError::WrongLength {
                name: info.name.clone(),
                expected: info.size,
                got: values.len(),
            });
        }
        if info.round != self.round {
            return Err(AssignmentError::WrongRound {
                name: info.name.clone(),
                column_round: info.round,
                round: self.round,
            });
        }
        if self.is_assigned(id) {
            return Err(AssignmentError::AlreadyAssigned {
                name: info.name.clone(),
            });
        }
        self.columns[id.index()] = Some(Arc::new(values));
        Ok(())
    }

    /// Assigns a column supplied by the witness source.
    pub(crate) fn assign_witness(&mut self, id: ColumnId, values: Vec<FieldElement>) -> Result<(), AssignmentError> {
        let info = self.spec.columns().info(id);
        if info.origin != ColumnOrigin::Witness || matches!(info.kind, ColumnKind::Precomputed) {
            return Err(AssignmentError::NotAssignable {
                name: info.name.clone(),
                kind: info.kind,
            });
        }
        self.store(id, values)
    }

    /// Assigns a column computed by a prover action.
    pub(crate) fn assign_derived(&mut self, id: ColumnId, values: Vec<FieldElement>) -> Result<(), AssignmentError> {
        let info = self.spec.columns().info(id);
        if info.origin != ColumnOrigin::Derived || info.kind == ColumnKind::VerifierDefined {
            return Err(AssignmentError::NotAssignable {
                name: info.name.clone(),
                kind: info.kind,
            });
        }
        self.store(id, values)
    }

    pub(crate) fn set_digests(&mut self, slot: SlotId, digests: Vec<Digest>) -> Result<(), AssignmentError> {
        let info = self.spec.slot(slot).ok_or_else(|| AssignmentError::MissingDigests {
            name: slot.to_string(),
        })?;
        if digests.len() != info.count {
            return Err(AssignmentError::action(
                "digest slot",
                format!("slot `{}` holds {} digests, got {}", info.name, info.count, digests.len()),
            ));
        }
        self.digests[slot.index()] = Some(digests);
        Ok(())
    }

    pub(crate) fn begin_round(&mut self, round: usize) -> Result<(), AssignmentError> {
        if round > 0 {
            self.transcript.advance();
        }
        self.round = round;
        let spec = self.spec;
        for (id, info) in spec.coins().in_round(round) {
            let value = draw(&mut self.transcript, round, info)?;
            self.coins[id.index()] = Some(value);
        }
        for (id, recipe) in &spec.verifier_columns {
            if spec.columns().info(*id).round != round {
                continue;
            }
            let values = materialize_verifier_column(spec, *id, recipe, &*self).map_err(|failure| {
                AssignmentError::action("verifier column", failure.to_string())
            })?;
            self.columns[id.index()] = Some(Arc::new(values));
        }
        Ok(())
    }

    /// Ensures every column of kind `origin` of the current round is set.
    pub(crate) fn ensure_assigned(&self, origin: ColumnOrigin) -> Result<(), AssignmentError> {
        for (id, info) in self.spec.columns().iter() {
            if info.round == self.round && info.origin == origin && !self.is_assigned(id) {
                return Err(AssignmentError::MissingColumn {
                    name: info.name.clone(),
                    round: self.round,
                });
            }
        }
        Ok(())
    }

    /// Computes results, optionally checks the round's queries, and absorbs
    /// the round payload.
    pub(crate) fn close_round(&mut self) -> Result<(), AssignmentError> {
        let round = self.round;
        let spec = self.spec;
        self.ensure_assigned(ColumnOrigin::Derived)?;
        for (index, slot) in self.spec.slots().iter().enumerate() {
            if slot.round == round && self.digests[index].is_none() {
                return Err(AssignmentError::MissingDigests {
                    name: slot.name.clone(),
                });
            }
        }
        let result_queries: Vec<QueryId> = spec
            .queries()
            .iter()
            .filter(|(_, info)| info.round == round && info.query.result_len().is_some())
            .map(|(id, _)| id)
            .collect();
        for id in result_queries {
            let params = compute_params(spec, id, &*self).map_err(|failure| AssignmentError::QueryViolated {
                query: spec.queries().info(id).name.clone(),
                failure,
            })?;
            self.params[id.index()] = Some(params);
        }
        if self.check_witness {
            for (id, info) in spec.queries().iter() {
                if info.round != round {
                    continue;
                }
                check_query(spec, id, &*self).map_err(|failure| AssignmentError::QueryViolated {
                    query: info.name.clone(),
                    failure,
                })?;
            }
        }
        self.absorb_round()
    }

    fn absorb_round(&mut self) -> Result<(), AssignmentError> {
        let round = self.round;
        let spec = self.spec;
        for item in spec.round_items(round) {
            match item {
                RoundItem::Commitment(id) => {
                    let digest = column_commitment(self.column(id)?);
                    let name = &spec.columns().info(id).name;
                    self.transcript
                        .absorb_digests(round, TranscriptLabel::ColumnCommitment, name, &[digest])?;
                    self.commitments.insert(id, digest);
                }
                RoundItem::Message(id) => {
                    let values = Arc::clone(self.columns[id.index()].as_ref().ok_or_else(|| {
                        AssignmentError::MissingColumn {
                            name: spec.columns().info(id).name.clone(),
                            round,
                        }
                    })?);
                    let name = &spec.columns().info(id).name;
                    self.transcript
                        .absorb_field_elements(round, TranscriptLabel::Message, name, &values)?;
                }
                RoundItem::Digests(slot) => {
                    let digests = self.slot_digests(slot)?.to_vec();
                    let name = spec.slot(slot).map(|slot| slot.name.as_str()).unwrap_or_default();
                    self.transcript
                        .absorb_digests(round, TranscriptLabel::Digest, name, &digests)?;
                }
                RoundItem::Params(id) => {
                    let values = self.query_params(id)?.values.clone();
                    let name = &spec.queries().info(id).name;
                    self.transcript
                        .absorb_field_elements(round, TranscriptLabel::QueryParams, name, &values)?;
                }
            }
        }
        debug!(round, "round closed");
        Ok(())
    }

    /// Packs everything the verifier reads into a proof.
    pub(crate) fn finish(self) -> Result<(Proof, Option<Vec<TranscriptEvent>>), AssignmentError> {
        let layout = ProofLayout::of(self.spec);
        let column_commitments = layout
            .commitments
            .iter()
            .map(|id| {
                self.commitments.get(id).copied().ok_or_else(|| AssignmentError::MissingColumn {
                    name: self.column_name(*id),
                    round: self.round,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let messages = layout
            .messages
            .iter()
            .map(|id| self.column(*id).map(<[FieldElement]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;
        let digests = layout
            .digests
            .iter()
            .map(|slot| self.slot_digests(*slot).map(<[Digest]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;
        let params = layout
            .params
            .iter()
            .map(|id| self.query_params(*id).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let proof = Proof {
            version: PROOF_VERSION,
            spec_digest: Digest(self.spec.fingerprint()),
            column_commitments,
            messages,
            digests,
            params,
        };
        let events = self.transcript.events().map(<[TranscriptEvent]>::to_vec);
        Ok((proof, events))
    }
}

#[cfg(test)]
impl ProverRuntime<'_> {
    /// Seeds the transcript as if proving `other`.
    pub(crate) fn reseed_for(&mut self, other: &Specification) {
        self.transcript = Transcript::new(&other.fingerprint(), other.params_hash());
    }
}

impl Assignment for ProverRuntime<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_commitments_are_domain_separated() {
        let values: Vec<FieldElement> = (1..=4).map(FieldElement::new).collect();
        let commitment = column_commitment(&values);
        assert_eq!(commitment, column_commitment(&values));
        assert_ne!(commitment, column_commitment(&values[..3]));
        assert_ne!(commitment.0, hash_field_elements(b"", &values).into_bytes());
    }
}
