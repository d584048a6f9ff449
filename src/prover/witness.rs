//! Witness sources feeding the prover round by round.

use std::collections::BTreeMap;

use super::errors::AssignmentError;
use super::runtime::ProverRuntime;
use crate::field::FieldElement;
use crate::iop::{CoinValue, ColumnId, ColumnKind, ColumnOrigin};

/// Supplies the witness columns of each round.
///
/// Called once per round, after the coins of that round were drawn, so
/// later-round columns may depend on earlier challenges.
pub trait WitnessSource {
    fn assign_round(&mut self, round: usize, assignment: &mut RoundAssignment<'_, '_>) -> Result<(), AssignmentError>;
}

/// Handle through which a [`WitnessSource`] assigns one round.
pub struct RoundAssignment<'r, 'a> {
    runtime: &'r mut ProverRuntime<'a>,
}

impl<'r, 'a> RoundAssignment<'r, 'a> {
    pub(crate) fn new(runtime: &'r mut ProverRuntime<'a>) -> Self {
        Self { runtime }
    }

    pub fn round(&self) -> usize {
        self.runtime.round()
    }

    fn lookup(&self, name: &str) -> Result<ColumnId, AssignmentError> {
        self.runtime
            .spec()
            .column_id(name)
            .ok_or_else(|| AssignmentError::UnknownColumn { name: name.to_owned() })
    }

    pub fn assign(&mut self, name: &str, values: Vec<FieldElement>) -> Result<(), AssignmentError> {
        let id = self.lookup(name)?;
        self.runtime.assign_witness(id, values)
    }

    pub fn assign_id(&mut self, id: ColumnId, values: Vec<FieldElement>) -> Result<(), AssignmentError> {
        self.runtime.assign_witness(id, values)
    }

    /// Values of an already assigned column, including public ones.
    pub fn column(&self, name: &str) -> Result<&[FieldElement], AssignmentError> {
        let id = self.lookup(name)?;
        self.runtime.column(id)
    }

    pub fn coin(&self, name: &str) -> Result<&CoinValue, AssignmentError> {
        let id = self
            .runtime
            .spec()
            .coin_id(name)
            .ok_or_else(|| AssignmentError::MissingCoin { name: name.to_owned() })?;
        self.runtime.coin(id)
    }

    /// Witness columns of this round that are still unassigned.
    pub fn pending(&self) -> Vec<String> {
        let round = self.round();
        self.runtime
            .spec()
            .columns()
            .iter()
            .filter(|(id, info)| {
                info.round == round && is_witness_column(info.kind, info.origin) && !self.runtime.is_assigned(*id)
            })
            .map(|(_, info)| info.name.clone())
            .collect()
    }
}

pub(crate) fn is_witness_column(kind: ColumnKind, origin: ColumnOrigin) -> bool {
    origin == ColumnOrigin::Witness && kind != ColumnKind::Precomputed
}

/// Column values keyed by name, all known up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    columns: BTreeMap<String, Vec<FieldElement>>,
}

impl Witness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, values: Vec<FieldElement>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn insert(&mut self, name: &str, values: Vec<FieldElement>) {
        self.columns.insert(name.to_owned(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[FieldElement]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<FieldElement>> {
        self.columns.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }
}

impl<'n> FromIterator<(&'n str, Vec<FieldElement>)> for Witness {
    fn from_iter<I: IntoIterator<Item = (&'n str, Vec<FieldElement>)>>(iter: I) -> Self {
        let mut witness = Witness::new();
        for (name, values) in iter {
            witness.insert(name, values);
        }
        witness
    }
}

impl WitnessSource for Witness {
    fn assign_round(&mut self, round: usize, assignment: &mut RoundAssignment<'_, '_>) -> Result<(), AssignmentError> {
        let spec = assignment.runtime.spec();
        if round == 0 {
            for name in self.columns.keys() {
                let known = spec
                    .columns()
                    .lookup(name)
                    .map(|id| {
                        let info = spec.columns().info(id);
                        is_witness_column(info.kind, info.origin)
                    })
                    .unwrap_or(false);
                if !known {
                    return Err(AssignmentError::UnknownColumn { name: name.clone() });
                }
            }
        }
        for (id, info) in spec.columns().iter() {
            if info.round != round || !is_witness_column(info.kind, info.origin) {
                continue;
            }
            let values = self
                .columns
                .get(&info.name)
                .cloned()
                .ok_or_else(|| AssignmentError::MissingColumn {
                    name: info.name.clone(),
                    round,
                })?;
            assignment.assign_id(id, values)?;
        }
        Ok(())
    }
}

/// Adapts a closure into a [`WitnessSource`].
pub struct FnWitness<F>(pub F);

impl<F> FnWitness<F>
where
    F: FnMut(usize, &mut RoundAssignment<'_, '_>) -> Result<(), AssignmentError>,
{
    pub fn new(assign: F) -> Self {
        Self(assign)
    }
}

impl<F> WitnessSource for FnWitness<F>
where
    F: FnMut(usize, &mut RoundAssignment<'_, '_>) -> Result<(), AssignmentError>,
{
    fn assign_round(&mut self, round: usize, assignment: &mut RoundAssignment<'_, '_>) -> Result<(), AssignmentError> {
        (self.0)(round, assignment)
    }
}
