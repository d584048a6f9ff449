//! Query catalogue.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::errors::DefinitionError;
use super::expr::Expr;
use super::ids::{CoinId, ColumnId, QueryId};
use crate::field::FieldElement;

/// Vanishing identity over all rows of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConstraint {
    pub expr: Expr,
    pub domain_size: usize,
    /// Shifted reads wrap around instead of exempting the boundary rows.
    pub cyclic: bool,
}

/// Identity evaluated once, at row 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConstraint {
    pub expr: Expr,
    pub domain_size: usize,
}

/// Multiset equality of the concatenated columns of both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permutation {
    pub a: Vec<ColumnId>,
    pub b: Vec<ColumnId>,
}

/// Row tuples of `included` (restricted to rows where `filter` is non-zero)
/// appear among the row tuples of `including`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub included: Vec<ColumnId>,
    pub including: Vec<ColumnId>,
    pub filter: Option<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerProduct {
    pub a: ColumnId,
    pub bs: Vec<ColumnId>,
}

/// Where a univariate evaluation takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalPoint {
    Constant(FieldElement),
    Coin(CoinId),
    /// `factor * coin`.
    ScaledCoin { coin: CoinId, factor: FieldElement },
    /// `w^k` where `w` generates the subgroup of size `domain_size` and `k`
    /// is entry `index` of an integer coin.
    RootPower {
        coin: CoinId,
        index: usize,
        domain_size: usize,
    },
}

impl EvalPoint {
    pub fn coin(&self) -> Option<CoinId> {
        match self {
            EvalPoint::Constant(_) => None,
            EvalPoint::Coin(coin) | EvalPoint::ScaledCoin { coin, .. } | EvalPoint::RootPower { coin, .. } => {
                Some(*coin)
            }
        }
    }
}

/// Columns read as polynomials in Lagrange form over their own subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnivariateEval {
    pub columns: Vec<ColumnId>,
    pub point: EvalPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub column: ColumnId,
    pub bound: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalOpening {
    pub column: ColumnId,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    Global(GlobalConstraint),
    Local(LocalConstraint),
    Permutation(Permutation),
    Inclusion(Inclusion),
    InnerProduct(InnerProduct),
    UnivariateEval(UnivariateEval),
    Range(Range),
    LocalOpening(LocalOpening),
}

impl Query {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Query::Global(_) => "global",
            Query::Local(_) => "local",
            Query::Permutation(_) => "permutation",
            Query::Inclusion(_) => "inclusion",
            Query::InnerProduct(_) => "inner-product",
            Query::UnivariateEval(_) => "univariate-eval",
            Query::Range(_) => "range",
            Query::LocalOpening(_) => "local-opening",
        }
    }

    /// Number of field elements the query contributes to the proof.
    pub fn result_len(&self) -> Option<usize> {
        match self {
            Query::InnerProduct(q) => Some(q.bs.len()),
            Query::UnivariateEval(q) => Some(q.columns.len()),
            Query::LocalOpening(_) => Some(1),
            _ => None,
        }
    }

    pub fn columns(&self) -> BTreeSet<ColumnId> {
        match self {
            Query::Global(q) => q.expr.columns(),
            Query::Local(q) => q.expr.columns(),
            Query::Permutation(q) => q.a.iter().chain(&q.b).copied().collect(),
            Query::Inclusion(q) => q
                .included
                .iter()
                .chain(&q.including)
                .chain(q.filter.iter())
                .copied()
                .collect(),
            Query::InnerProduct(q) => core::iter::once(q.a).chain(q.bs.iter().copied()).collect(),
            Query::UnivariateEval(q) => q.columns.iter().copied().collect(),
            Query::Range(q) => BTreeSet::from([q.column]),
            Query::LocalOpening(q) => BTreeSet::from([q.column]),
        }
    }

    pub fn coins(&self) -> BTreeSet<CoinId> {
        match self {
            Query::Global(q) => q.expr.coins(),
            Query::Local(q) => q.expr.coins(),
            Query::UnivariateEval(q) => q.point.coin().into_iter().collect(),
            _ => BTreeSet::new(),
        }
    }
}

/// Result carried in the proof for a result query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub values: Vec<FieldElement>,
}

impl QueryParams {
    pub fn new(values: Vec<FieldElement>) -> Self {
        Self { values }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Pending,
    /// A pass has taken over the enforcement of this query.
    Compiled { pass: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    pub name: String,
    pub round: usize,
    pub query: Query,
    pub status: QueryStatus,
}

impl QueryInfo {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, QueryStatus::Pending)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRegistry {
    entries: Vec<QueryInfo>,
    by_name: BTreeMap<String, QueryId>,
}

impl QueryRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: QueryId) -> Option<&QueryInfo> {
        self.entries.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<QueryId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, &QueryInfo)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, info)| (QueryId::from_index(index), info))
    }

    pub fn pending(&self) -> impl Iterator<Item = (QueryId, &QueryInfo)> + '_ {
        self.iter().filter(|(_, info)| info.is_pending())
    }

    pub(crate) fn info(&self, id: QueryId) -> &QueryInfo {
        &self.entries[id.index()]
    }

    pub(crate) fn insert(&mut self, info: QueryInfo) -> Result<QueryId, DefinitionError> {
        if self.by_name.contains_key(&info.name) {
            return Err(DefinitionError::DuplicateName { name: info.name });
        }
        let id = QueryId::from_index(self.entries.len());
        self.by_name.insert(info.name.clone(), id);
        self.entries.push(info);
        Ok(id)
    }

    pub(crate) fn mark_compiled(&mut self, id: QueryId, pass: &str) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.status = QueryStatus::Compiled { pass: pass.to_owned() };
        }
    }
}
