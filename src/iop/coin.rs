//! Coin registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::DefinitionError;
use super::ids::CoinId;
use crate::field::{ExtElement, FieldElement};
use crate::transcript::{Transcript, TranscriptError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinKind {
    /// One base field element.
    Field,
    /// One element of the quadratic extension.
    Extension,
    /// `count` integers drawn uniformly from `[0, bound)`.
    Integers { count: usize, bound: usize },
}

/// Value of a drawn coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinValue {
    Field(FieldElement),
    Extension(ExtElement),
    Integers(Vec<usize>),
}

impl CoinValue {
    pub fn as_field(&self) -> Option<FieldElement> {
        match self {
            CoinValue::Field(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integers(&self) -> Option<&[usize]> {
        match self {
            CoinValue::Integers(values) => Some(values),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub name: String,
    pub round: usize,
    pub kind: CoinKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinRegistry {
    entries: Vec<CoinInfo>,
    by_name: BTreeMap<String, CoinId>,
}

impl CoinRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: CoinId) -> Option<&CoinInfo> {
        self.entries.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<CoinId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoinId, &CoinInfo)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, info)| (CoinId::from_index(index), info))
    }

    /// Coins sampled at the start of `round`, in registration order.
    pub fn in_round(&self, round: usize) -> impl Iterator<Item = (CoinId, &CoinInfo)> + '_ {
        self.iter().filter(move |(_, info)| info.round == round)
    }

    pub(crate) fn info(&self, id: CoinId) -> &CoinInfo {
        &self.entries[id.index()]
    }

    pub(crate) fn contains(&self, id: CoinId) -> bool {
        id.index() < self.entries.len()
    }

    pub(crate) fn insert(&mut self, info: CoinInfo) -> Result<CoinId, DefinitionError> {
        if info.round == 0 {
            return Err(DefinitionError::InvalidCoin {
                name: info.name,
                detail: "coins cannot be drawn before the first prover message".into(),
            });
        }
        if let CoinKind::Integers { count, bound } = info.kind {
            if count == 0 || bound == 0 {
                return Err(DefinitionError::InvalidCoin {
                    name: info.name,
                    detail: format!("integer coin needs a positive count and bound, got {count} and {bound}"),
                });
            }
        }
        if self.by_name.contains_key(&info.name) {
            return Err(DefinitionError::DuplicateName { name: info.name });
        }
        let id = CoinId::from_index(self.entries.len());
        self.by_name.insert(info.name.clone(), id);
        self.entries.push(info);
        Ok(id)
    }
}

/// Draws the value of `info` from the transcript at `round`.
pub(crate) fn draw(transcript: &mut Transcript, round: usize, info: &CoinInfo) -> Result<CoinValue, TranscriptError> {
    Ok(match info.kind {
        CoinKind::Field => CoinValue::Field(transcript.challenge_field(round, &info.name)?),
        CoinKind::Extension => CoinValue::Extension(transcript.challenge_ext(round, &info.name)?),
        CoinKind::Integers { count, bound } => {
            CoinValue::Integers(transcript.challenge_integers(round, &info.name, count, bound)?)
        }
    })
}
