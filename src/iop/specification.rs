//! The constraint system: registries plus per-round prover and verifier
//! actions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::coin::{CoinInfo, CoinKind, CoinRegistry};
use super::column::{ColumnInfo, ColumnKind, ColumnOrigin, ColumnRegistry, VerifierColumn};
use super::errors::DefinitionError;
use super::fingerprint::{absorb_query, absorb_recipe};
use super::ids::{CoinId, ColumnId, QueryId, SlotId};
use super::query::{EvalPoint, Query, QueryInfo, QueryRegistry, QueryStatus};
use crate::compiler::actions::{ProverAction, VerifierAction};
use crate::field::FieldElement;
use crate::hash::Hasher;

const FINGERPRINT_DOMAIN: &[u8] = b"RPP-WIZARD-SPECIFICATION-V1";

/// Whether the digests of a slot travel in the proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotVisibility {
    Sent,
    /// Kept by the prover; a later pass proves statements about them.
    ProverOnly,
}

/// Fixed-size list of digests produced by a prover action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSlot {
    pub name: String,
    pub round: usize,
    pub count: usize,
    pub visibility: SlotVisibility,
}

/// One entry of a round's transcript payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundItem {
    Commitment(ColumnId),
    Message(ColumnId),
    Digests(SlotId),
    Params(QueryId),
}

/// Frozen constraint system.
///
/// Compiler passes consume a specification and return a new one; the
/// registries only ever grow. Precomputed vectors and compiler contexts are
/// shared behind `Arc`s, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct Specification {
    pub(crate) columns: ColumnRegistry,
    pub(crate) coins: CoinRegistry,
    pub(crate) queries: QueryRegistry,
    pub(crate) slots: Vec<DigestSlot>,
    pub(crate) precomputed: BTreeMap<ColumnId, Arc<Vec<FieldElement>>>,
    pub(crate) verifier_columns: BTreeMap<ColumnId, VerifierColumn>,
    pub(crate) prover_actions: Vec<Vec<ProverAction>>,
    pub(crate) verifier_actions: Vec<Vec<VerifierAction>>,
    pub(crate) frozen_rounds: usize,
    pub(crate) passes: Vec<String>,
    pub(crate) params_hash: [u8; 32],
    pub(crate) cell_limit: Option<u64>,
}

impl Default for Specification {
    fn default() -> Self {
        Self {
            columns: ColumnRegistry::default(),
            coins: CoinRegistry::default(),
            queries: QueryRegistry::default(),
            slots: Vec::new(),
            precomputed: BTreeMap::new(),
            verifier_columns: BTreeMap::new(),
            prover_actions: vec![Vec::new()],
            verifier_actions: vec![Vec::new()],
            frozen_rounds: 0,
            passes: Vec::new(),
            params_hash: [0u8; 32],
            cell_limit: None,
        }
    }
}

impl Specification {
    pub fn num_rounds(&self) -> usize {
        self.prover_actions.len()
    }

    /// Rounds fixed by the builder; compilation only appends after them.
    pub fn frozen_rounds(&self) -> usize {
        self.frozen_rounds
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn coins(&self) -> &CoinRegistry {
        &self.coins
    }

    pub fn queries(&self) -> &QueryRegistry {
        &self.queries
    }

    pub fn slots(&self) -> &[DigestSlot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> Option<&DigestSlot> {
        self.slots.get(id.index())
    }

    pub fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.columns.lookup(name)
    }

    pub fn coin_id(&self, name: &str) -> Option<CoinId> {
        self.coins.lookup(name)
    }

    pub fn query_id(&self, name: &str) -> Option<QueryId> {
        self.queries.lookup(name)
    }

    pub fn precomputed(&self, id: ColumnId) -> Option<&[FieldElement]> {
        self.precomputed.get(&id).map(|values| values.as_slice())
    }

    pub fn verifier_column(&self, id: ColumnId) -> Option<&VerifierColumn> {
        self.verifier_columns.get(&id)
    }

    pub fn prover_actions(&self, round: usize) -> &[ProverAction] {
        self.prover_actions.get(round).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn verifier_actions(&self, round: usize) -> &[VerifierAction] {
        self.verifier_actions.get(round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the passes applied so far, in order.
    pub fn applied_passes(&self) -> &[String] {
        &self.passes
    }

    pub fn pending_queries(&self) -> Vec<QueryId> {
        self.queries.pending().map(|(id, _)| id).collect()
    }

    pub fn params_hash(&self) -> &[u8; 32] {
        &self.params_hash
    }

    /// Blake2s digest of the full structure, absorbed first by every
    /// transcript.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update_framed(FINGERPRINT_DOMAIN);
        hasher.update_u64(self.num_rounds() as u64);
        hasher.update_u64(self.columns.len() as u64);
        for (_, info) in self.columns.iter() {
            hasher.update_framed(info.name.as_bytes());
            hasher.update_u64(info.size as u64);
            hasher.update_u64(info.round as u64);
            hasher.update(&[info.kind.code(), matches!(info.origin, ColumnOrigin::Derived) as u8]);
        }
        hasher.update_u64(self.coins.len() as u64);
        for (_, info) in self.coins.iter() {
            hasher.update_framed(info.name.as_bytes());
            hasher.update_u64(info.round as u64);
            match info.kind {
                CoinKind::Field => hasher.update(&[0]),
                CoinKind::Extension => hasher.update(&[1]),
                CoinKind::Integers { count, bound } => {
                    hasher.update(&[2]);
                    hasher.update_u64(count as u64);
                    hasher.update_u64(bound as u64);
                }
            }
        }
        hasher.update_u64(self.queries.len() as u64);
        for (_, info) in self.queries.iter() {
            hasher.update_framed(info.name.as_bytes());
            hasher.update_u64(info.round as u64);
            hasher.update(&[info.is_pending() as u8]);
            absorb_query(&mut hasher, &info.query);
        }
        hasher.update_u64(self.slots.len() as u64);
        for slot in &self.slots {
            hasher.update_framed(slot.name.as_bytes());
            hasher.update_u64(slot.round as u64);
            hasher.update_u64(slot.count as u64);
            hasher.update(&[matches!(slot.visibility, SlotVisibility::Sent) as u8]);
        }
        for (id, values) in &self.precomputed {
            hasher.update_u64(id.index() as u64);
            hasher.update_felts(values);
        }
        for (id, recipe) in &self.verifier_columns {
            hasher.update_u64(id.index() as u64);
            absorb_recipe(&mut hasher, recipe);
        }
        for (round, (prover, verifier)) in self.prover_actions.iter().zip(&self.verifier_actions).enumerate() {
            hasher.update_u64(round as u64);
            for action in prover {
                hasher.update_framed(action.label().as_bytes());
            }
            for action in verifier {
                hasher.update_framed(action.label().as_bytes());
            }
        }
        for pass in &self.passes {
            hasher.update_framed(pass.as_bytes());
        }
        hasher.finalize().into_bytes()
    }

    /// Everything the prover sends at the end of `round`, in the order both
    /// sides absorb it: hash commitments, clear columns, sent digest slots,
    /// query results.
    pub(crate) fn round_items(&self, round: usize) -> Vec<RoundItem> {
        let mut items: Vec<RoundItem> = self
            .columns
            .iter()
            .filter(|(_, info)| info.round == round && info.kind == ColumnKind::Committed)
            .map(|(id, _)| RoundItem::Commitment(id))
            .collect();
        items.extend(
            self.columns
                .iter()
                .filter(|(_, info)| info.round == round && info.kind == ColumnKind::Proof)
                .map(|(id, _)| RoundItem::Message(id)),
        );
        items.extend(
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.round == round && slot.visibility == SlotVisibility::Sent)
                .map(|(index, _)| RoundItem::Digests(SlotId::from_index(index))),
        );
        items.extend(
            self.queries
                .iter()
                .filter(|(_, info)| info.round == round && info.query.result_len().is_some())
                .map(|(id, _)| RoundItem::Params(id)),
        );
        items
    }

    /// Name derived from `base` that no registry uses yet.
    pub(crate) fn fresh_name(&self, base: &str) -> String {
        let taken = |name: &str| {
            self.columns.lookup(name).is_some()
                || self.coins.lookup(name).is_some()
                || self.queries.lookup(name).is_some()
                || self.slots.iter().any(|slot| slot.name == name)
        };
        if !taken(base) {
            return base.to_owned();
        }
        (1..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_owned())
    }

    fn ensure_round(&mut self, round: usize) {
        while self.prover_actions.len() <= round {
            self.prover_actions.push(Vec::new());
            self.verifier_actions.push(Vec::new());
        }
    }

    pub(crate) fn register_column(
        &mut self,
        name: impl Into<String>,
        size: usize,
        round: usize,
        kind: ColumnKind,
        origin: ColumnOrigin,
    ) -> Result<ColumnId, DefinitionError> {
        let id = self.columns.insert(ColumnInfo {
            name: name.into(),
            size,
            round,
            kind,
            origin,
        })?;
        self.ensure_round(round);
        Ok(id)
    }

    pub(crate) fn register_precomputed(
        &mut self,
        name: impl Into<String>,
        values: Arc<Vec<FieldElement>>,
    ) -> Result<ColumnId, DefinitionError> {
        let id = self.register_column(
            name,
            values.len(),
            0,
            ColumnKind::Precomputed,
            ColumnOrigin::Witness,
        )?;
        self.precomputed.insert(id, values);
        Ok(id)
    }

    pub(crate) fn register_verifier_column(
        &mut self,
        name: impl Into<String>,
        size: usize,
        round: usize,
        recipe: VerifierColumn,
    ) -> Result<ColumnId, DefinitionError> {
        let name = name.into();
        let (dependency, dependency_round) = match &recipe {
            VerifierColumn::IntegerCoin { coin } => {
                if !self.coins.contains(*coin) {
                    return Err(DefinitionError::UnknownReference { name, what: "coin" });
                }
                let info = self.coins.info(*coin);
                (info.name.clone(), info.round)
            }
            VerifierColumn::DigestSlots { slots } => {
                let mut latest = (String::new(), 0);
                for slot in slots {
                    let info = self
                        .slots
                        .get(slot.index())
                        .ok_or_else(|| DefinitionError::UnknownReference {
                            name: name.clone(),
                            what: "digest slot",
                        })?;
                    if info.round >= latest.1 {
                        latest = (info.name.clone(), info.round);
                    }
                }
                latest
            }
            VerifierColumn::QueryResults { queries } => {
                let mut latest = (String::new(), 0);
                for query in queries {
                    let info = self
                        .queries
                        .get(*query)
                        .ok_or_else(|| DefinitionError::UnknownReference {
                            name: name.clone(),
                            what: "query",
                        })?;
                    // Results of round r are only known once round r closed.
                    if info.round + 1 >= latest.1 {
                        latest = (info.name.clone(), info.round + 1);
                    }
                }
                latest
            }
        };
        if dependency_round > round {
            return Err(DefinitionError::RoundOrder {
                name,
                dependency,
                dependency_round,
                round,
            });
        }
        let id = self.register_column(
            name,
            size,
            round,
            ColumnKind::VerifierDefined,
            ColumnOrigin::Derived,
        )?;
        self.verifier_columns.insert(id, recipe);
        Ok(id)
    }

    pub(crate) fn register_coin(
        &mut self,
        name: impl Into<String>,
        round: usize,
        kind: CoinKind,
    ) -> Result<CoinId, DefinitionError> {
        let id = self.coins.insert(CoinInfo {
            name: name.into(),
            round,
            kind,
        })?;
        self.ensure_round(round);
        Ok(id)
    }

    pub(crate) fn register_query(
        &mut self,
        name: impl Into<String>,
        round: usize,
        query: Query,
    ) -> Result<QueryId, DefinitionError> {
        let name = name.into();
        self.validate_query(&name, round, &query)?;
        let id = self.queries.insert(QueryInfo {
            name,
            round,
            query,
            status: QueryStatus::Pending,
        })?;
        self.ensure_round(round);
        Ok(id)
    }

    pub(crate) fn register_slot(
        &mut self,
        name: impl Into<String>,
        round: usize,
        count: usize,
        visibility: SlotVisibility,
    ) -> Result<SlotId, DefinitionError> {
        let name = name.into();
        if self.slots.iter().any(|slot| slot.name == name) {
            return Err(DefinitionError::DuplicateName { name });
        }
        let id = SlotId::from_index(self.slots.len());
        self.slots.push(DigestSlot {
            name,
            round,
            count,
            visibility,
        });
        self.ensure_round(round);
        Ok(id)
    }

    pub(crate) fn push_prover_action(&mut self, round: usize, action: ProverAction) {
        self.ensure_round(round);
        self.prover_actions[round].push(action);
    }

    pub(crate) fn push_verifier_action(&mut self, round: usize, action: VerifierAction) {
        self.ensure_round(round);
        self.verifier_actions[round].push(action);
    }

    pub(crate) fn mark_compiled(&mut self, id: QueryId, pass: &str) {
        self.queries.mark_compiled(id, pass);
    }

    pub(crate) fn set_column_kind(&mut self, id: ColumnId, kind: ColumnKind) {
        self.columns.set_kind(id, kind);
    }

    pub(crate) fn set_slot_visibility(&mut self, id: SlotId, visibility: SlotVisibility) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.visibility = visibility;
        }
    }

    fn validate_query(&self, name: &str, round: usize, query: &Query) -> Result<(), DefinitionError> {
        for column in query.columns() {
            if !self.columns.contains(column) {
                return Err(DefinitionError::UnknownReference {
                    name: name.to_owned(),
                    what: "column",
                });
            }
            let info = self.columns.info(column);
            if info.round > round {
                return Err(DefinitionError::RoundOrder {
                    name: name.to_owned(),
                    dependency: info.name.clone(),
                    dependency_round: info.round,
                    round,
                });
            }
        }
        for coin in query.coins() {
            if !self.coins.contains(coin) {
                return Err(DefinitionError::UnknownReference {
                    name: name.to_owned(),
                    what: "coin",
                });
            }
            let info = self.coins.info(coin);
            if info.round > round {
                return Err(DefinitionError::RoundOrder {
                    name: name.to_owned(),
                    dependency: info.name.clone(),
                    dependency_round: info.round,
                    round,
                });
            }
        }

        let size = |id: ColumnId| self.columns.info(id).size;
        let same_size = |columns: &[ColumnId]| -> Result<Option<usize>, DefinitionError> {
            let mut expected: Option<usize> = None;
            for &column in columns {
                match expected {
                    None => expected = Some(size(column)),
                    Some(left) if left != size(column) => {
                        return Err(DefinitionError::SizeMismatch {
                            name: name.to_owned(),
                            left,
                            right: size(column),
                        })
                    }
                    Some(_) => {}
                }
            }
            Ok(expected)
        };
        let field_coins = |coins: &mut dyn Iterator<Item = CoinId>| -> Result<(), DefinitionError> {
            for coin in coins {
                let info = self.coins.info(coin);
                if info.kind != CoinKind::Field {
                    return Err(DefinitionError::CoinKind {
                        name: name.to_owned(),
                        coin: info.name.clone(),
                    });
                }
            }
            Ok(())
        };

        match query {
            Query::Global(q) => {
                let columns: Vec<_> = q.expr.columns().into_iter().collect();
                check_domain(name, same_size(&columns)?, q.domain_size)?;
                field_coins(&mut q.expr.coins().into_iter())
            }
            Query::Local(q) => {
                let columns: Vec<_> = q.expr.columns().into_iter().collect();
                check_domain(name, same_size(&columns)?, q.domain_size)?;
                field_coins(&mut q.expr.coins().into_iter())
            }
            Query::Permutation(q) => {
                if q.a.is_empty() || q.b.is_empty() {
                    return Err(DefinitionError::EmptyQuery { name: name.to_owned() });
                }
                let left: usize = q.a.iter().map(|&c| size(c)).sum();
                let right: usize = q.b.iter().map(|&c| size(c)).sum();
                if left != right {
                    return Err(DefinitionError::ShapeMismatch {
                        name: name.to_owned(),
                        detail: format!("sides hold {left} and {right} values"),
                    });
                }
                Ok(())
            }
            Query::Inclusion(q) => {
                if q.included.is_empty() || q.including.is_empty() {
                    return Err(DefinitionError::EmptyQuery { name: name.to_owned() });
                }
                if q.included.len() != q.including.len() {
                    return Err(DefinitionError::ShapeMismatch {
                        name: name.to_owned(),
                        detail: format!(
                            "tuples of arity {} looked up in a table of arity {}",
                            q.included.len(),
                            q.including.len()
                        ),
                    });
                }
                let mut included = q.included.clone();
                included.extend(q.filter.iter().copied());
                same_size(&included)?;
                same_size(&q.including)?;
                Ok(())
            }
            Query::InnerProduct(q) => {
                if q.bs.is_empty() {
                    return Err(DefinitionError::EmptyQuery { name: name.to_owned() });
                }
                let mut all = vec![q.a];
                all.extend(q.bs.iter().copied());
                same_size(&all)?;
                Ok(())
            }
            Query::UnivariateEval(q) => {
                if q.columns.is_empty() {
                    return Err(DefinitionError::EmptyQuery { name: name.to_owned() });
                }
                match &q.point {
                    EvalPoint::Constant(_) => Ok(()),
                    EvalPoint::Coin(coin) | EvalPoint::ScaledCoin { coin, .. } => {
                        field_coins(&mut core::iter::once(*coin))
                    }
                    EvalPoint::RootPower {
                        coin,
                        index,
                        domain_size,
                    } => {
                        let info = self.coins.info(*coin);
                        match info.kind {
                            CoinKind::Integers { count, bound }
                                if *index < count
                                    && domain_size.is_power_of_two()
                                    && bound <= *domain_size =>
                            {
                                Ok(())
                            }
                            _ => Err(DefinitionError::CoinKind {
                                name: name.to_owned(),
                                coin: info.name.clone(),
                            }),
                        }
                    }
                }
            }
            Query::Range(q) => {
                if q.bound == 0 {
                    return Err(DefinitionError::ShapeMismatch {
                        name: name.to_owned(),
                        detail: "range bound must be positive".into(),
                    });
                }
                Ok(())
            }
            Query::LocalOpening(q) => {
                let column_size = size(q.column);
                if q.position >= column_size {
                    return Err(DefinitionError::PositionOutOfRange {
                        name: self.columns.info(q.column).name.clone(),
                        position: q.position,
                        size: column_size,
                    });
                }
                Ok(())
            }
        }
    }
}

fn check_domain(name: &str, found: Option<usize>, declared: usize) -> Result<(), DefinitionError> {
    match found {
        None => Err(DefinitionError::EmptyQuery { name: name.to_owned() }),
        Some(size) if size != declared => Err(DefinitionError::SizeMismatch {
            name: name.to_owned(),
            left: declared,
            right: size,
        }),
        Some(_) => Ok(()),
    }
}
