//! One-shot definition phase.

use std::sync::Arc;

use tracing::debug;

use super::coin::CoinKind;
use super::column::{ColumnKind, ColumnOrigin};
use super::errors::DefinitionError;
use super::expr::Expr;
use super::ids::{CoinId, ColumnId, QueryId};
use super::query::{
    EvalPoint, GlobalConstraint, Inclusion, InnerProduct, LocalConstraint, LocalOpening, Permutation, Query, Range,
    UnivariateEval,
};
use super::specification::Specification;
use crate::field::FieldElement;

/// Registration handle handed to the definition function.
///
/// Every registration targets the current round; [`Builder::next_round`]
/// moves forward and there is no way back. The first rejected registration
/// is latched and reported by [`Builder::define`] even when the definition
/// function swallowed it.
#[derive(Debug)]
pub struct Builder {
    spec: Specification,
    round: usize,
    first_error: Option<DefinitionError>,
}

impl Builder {
    /// Runs `definition` once against a fresh specification and freezes the
    /// resulting round structure.
    pub fn define<F>(definition: F) -> Result<Specification, DefinitionError>
    where
        F: FnOnce(&mut Builder) -> Result<(), DefinitionError>,
    {
        let mut builder = Builder {
            spec: Specification::default(),
            round: 0,
            first_error: None,
        };
        let outcome = definition(&mut builder);
        if let Some(error) = builder.first_error.take() {
            return Err(error);
        }
        outcome?;
        let mut spec = builder.spec;
        spec.frozen_rounds = spec.num_rounds();
        debug!(
            rounds = spec.num_rounds(),
            columns = spec.columns.len(),
            coins = spec.coins.len(),
            queries = spec.queries.len(),
            "specification defined"
        );
        Ok(spec)
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn next_round(&mut self) -> usize {
        self.round += 1;
        self.round
    }

    /// Read access to what has been registered so far.
    pub fn spec(&self) -> &Specification {
        &self.spec
    }

    fn latch<T>(&mut self, result: Result<T, DefinitionError>) -> Result<T, DefinitionError> {
        if let Err(error) = &result {
            if self.first_error.is_none() {
                self.first_error = Some(error.clone());
            }
        }
        result
    }

    /// Witness column hidden behind a commitment.
    pub fn commit(&mut self, name: &str, size: usize) -> Result<ColumnId, DefinitionError> {
        let result = self
            .spec
            .register_column(name, size, self.round, ColumnKind::Committed, ColumnOrigin::Witness);
        self.latch(result)
    }

    /// Witness column sent in the clear.
    pub fn public_column(&mut self, name: &str, size: usize) -> Result<ColumnId, DefinitionError> {
        let result = self
            .spec
            .register_column(name, size, self.round, ColumnKind::Proof, ColumnOrigin::Witness);
        self.latch(result)
    }

    /// Column fixed at definition time.
    pub fn precomputed(&mut self, name: &str, values: Vec<FieldElement>) -> Result<ColumnId, DefinitionError> {
        let result = self.spec.register_precomputed(name, Arc::new(values));
        self.latch(result)
    }

    pub fn coin(&mut self, name: &str) -> Result<CoinId, DefinitionError> {
        let result = self.spec.register_coin(name, self.round, CoinKind::Field);
        self.latch(result)
    }

    pub fn extension_coin(&mut self, name: &str) -> Result<CoinId, DefinitionError> {
        let result = self.spec.register_coin(name, self.round, CoinKind::Extension);
        self.latch(result)
    }

    pub fn integer_coin(&mut self, name: &str, count: usize, bound: usize) -> Result<CoinId, DefinitionError> {
        let result = self
            .spec
            .register_coin(name, self.round, CoinKind::Integers { count, bound });
        self.latch(result)
    }

    fn query(&mut self, name: &str, query: Query) -> Result<QueryId, DefinitionError> {
        let result = self.spec.register_query(name, self.round, query);
        self.latch(result)
    }

    fn expr_domain(&mut self, name: &str, expr: &Expr) -> Result<usize, DefinitionError> {
        let first = expr.columns().into_iter().next();
        let result = match first.and_then(|id| self.spec.columns.get(id)) {
            Some(info) => Ok(info.size),
            None if first.is_some() => Err(DefinitionError::UnknownReference {
                name: name.to_owned(),
                what: "column",
            }),
            None => Err(DefinitionError::EmptyQuery { name: name.to_owned() }),
        };
        self.latch(result)
    }

    /// `expr` vanishes on every row; rows where a shifted read leaves the
    /// column are exempt.
    pub fn global(&mut self, name: &str, expr: Expr) -> Result<QueryId, DefinitionError> {
        let domain_size = self.expr_domain(name, &expr)?;
        self.query(
            name,
            Query::Global(GlobalConstraint {
                expr,
                domain_size,
                cyclic: false,
            }),
        )
    }

    /// Like [`Builder::global`], with shifted reads wrapping around.
    pub fn global_cyclic(&mut self, name: &str, expr: Expr) -> Result<QueryId, DefinitionError> {
        let domain_size = self.expr_domain(name, &expr)?;
        self.query(
            name,
            Query::Global(GlobalConstraint {
                expr,
                domain_size,
                cyclic: true,
            }),
        )
    }

    /// `expr` evaluated at row 0 equals zero.
    pub fn local(&mut self, name: &str, expr: Expr) -> Result<QueryId, DefinitionError> {
        let domain_size = self.expr_domain(name, &expr)?;
        self.query(name, Query::Local(LocalConstraint { expr, domain_size }))
    }

    pub fn permutation(&mut self, name: &str, a: &[ColumnId], b: &[ColumnId]) -> Result<QueryId, DefinitionError> {
        self.query(
            name,
            Query::Permutation(Permutation {
                a: a.to_vec(),
                b: b.to_vec(),
            }),
        )
    }

    pub fn inclusion(
        &mut self,
        name: &str,
        included: &[ColumnId],
        including: &[ColumnId],
    ) -> Result<QueryId, DefinitionError> {
        self.query(
            name,
            Query::Inclusion(Inclusion {
                included: included.to_vec(),
                including: including.to_vec(),
                filter: None,
            }),
        )
    }

    /// Inclusion restricted to the rows where `filter` is non-zero.
    pub fn inclusion_filtered(
        &mut self,
        name: &str,
        included: &[ColumnId],
        including: &[ColumnId],
        filter: ColumnId,
    ) -> Result<QueryId, DefinitionError> {
        self.query(
            name,
            Query::Inclusion(Inclusion {
                included: included.to_vec(),
                including: including.to_vec(),
                filter: Some(filter),
            }),
        )
    }

    pub fn inner_product(&mut self, name: &str, a: ColumnId, bs: &[ColumnId]) -> Result<QueryId, DefinitionError> {
        self.query(
            name,
            Query::InnerProduct(InnerProduct { a, bs: bs.to_vec() }),
        )
    }

    pub fn univariate(
        &mut self,
        name: &str,
        columns: &[ColumnId],
        point: EvalPoint,
    ) -> Result<QueryId, DefinitionError> {
        self.query(
            name,
            Query::UnivariateEval(UnivariateEval {
                columns: columns.to_vec(),
                point,
            }),
        )
    }

    pub fn range(&mut self, name: &str, column: ColumnId, bound: u64) -> Result<QueryId, DefinitionError> {
        self.query(name, Query::Range(Range { column, bound }))
    }

    pub fn local_opening(&mut self, name: &str, column: ColumnId, position: usize) -> Result<QueryId, DefinitionError> {
        self.query(name, Query::LocalOpening(LocalOpening { column, position }))
    }
}
