//! Plaintext reference compiler.
//!
//! Committed columns are sent in the clear and every pending query becomes a
//! verifier-side plaintext check. The resulting protocol has no succinctness
//! but accepts exactly the witnesses that satisfy the queries, which makes it
//! the oracle the cryptographic pipelines are tested against.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use super::actions::VerifierAction;
use super::{CompileError, CompilerPass};
use crate::field::FieldElement;
use crate::iop::check::{check_query, compute_params, materialize_verifier_column, Assignment};
use crate::iop::{CoinId, CoinValue, ColumnId, ColumnKind, QueryFailure, QueryId, QueryParams, Specification};
use crate::prover::Witness;

#[derive(Debug, Clone, Copy, Default)]
pub struct DummyCompiler;

impl CompilerPass for DummyCompiler {
    fn name(&self) -> &'static str {
        "dummy"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "dummy"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let committed: Vec<ColumnId> = spec
            .columns()
            .iter()
            .filter(|(_, info)| info.kind == ColumnKind::Committed)
            .map(|(id, _)| id)
            .collect();
        for id in &committed {
            spec.set_column_kind(*id, ColumnKind::Proof);
        }
        let pending: Vec<(QueryId, usize)> = spec
            .queries()
            .pending()
            .map(|(id, info)| (id, info.round))
            .collect();
        for (id, round) in &pending {
            spec.push_verifier_action(*round, VerifierAction::Plaintext(*id));
            spec.mark_compiled(*id, self.name());
        }
        debug!(columns = committed.len(), queries = pending.len(), "queries moved to plaintext checks");
        Ok(spec)
    }
}

/// Outcome of one query in an [`audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryVerdict {
    pub query: String,
    pub kind: &'static str,
    pub round: usize,
    /// `None` when the query holds.
    pub failure: Option<String>,
}

impl QueryVerdict {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Per-query pass/fail report of `witness` against an uncompiled
/// specification.
///
/// Only round-0 witness columns and round-0 queries without coins can be
/// decided from a static witness; queries that need coins are reported with
/// a missing-coin failure.
pub fn audit(spec: &Specification, witness: &Witness) -> Vec<QueryVerdict> {
    let mut plain = PlainAssignment::default();
    for (id, info) in spec.columns().iter() {
        if let Some(values) = spec.precomputed(id) {
            plain.columns.insert(id, values.to_vec());
        } else if let Some(values) = witness.get(&info.name) {
            if values.len() == info.size {
                plain.columns.insert(id, values.to_vec());
            }
        }
    }
    for (id, recipe) in &spec.verifier_columns {
        if let Ok(values) = materialize_verifier_column(spec, *id, recipe, &plain) {
            plain.columns.insert(*id, values);
        }
    }
    for (id, info) in spec.queries().iter() {
        if info.query.result_len().is_some() {
            if let Ok(params) = compute_params(spec, id, &plain) {
                plain.params.insert(id, params);
            }
        }
    }
    spec.queries()
        .iter()
        .map(|(id, info)| QueryVerdict {
            query: info.name.clone(),
            kind: info.query.kind_name(),
            round: info.round,
            failure: check_query(spec, id, &plain).err().map(|failure: QueryFailure| failure.to_string()),
        })
        .collect()
}

#[derive(Default)]
struct PlainAssignment {
    columns: BTreeMap<ColumnId, Vec<FieldElement>>,
    params: BTreeMap<QueryId, QueryParams>,
}

impl Assignment for PlainAssignment {
    fn column(&self, id: ColumnId) -> Option<&[FieldElement]> {
        self.columns.get(&id).map(Vec::as_slice)
    }

    fn coin(&self, _id: CoinId) -> Option<&CoinValue> {
        None
    }

    fn params(&self, id: QueryId) -> Option<&QueryParams> {
        self.params.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::{Builder, Expr};

    fn counter() -> Specification {
        Builder::define(|b| {
            let x = b.commit("x", 8)?;
            b.local("starts-at-zero", Expr::column(x))?;
            b.global("counter-step", Expr::column(x) - Expr::shifted(x, -1) - Expr::constant(1))?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn committed_columns_are_sent_in_clear() {
        let compiled = DummyCompiler.compile(counter()).unwrap();
        let x = compiled.column_id("x").unwrap();
        assert_eq!(compiled.columns().get(x).unwrap().kind, ColumnKind::Proof);
        assert!(compiled.pending_queries().is_empty());
        assert_eq!(compiled.verifier_actions(0).len(), 2);
    }

    #[test]
    fn audit_reports_the_failing_row() {
        let spec = counter();
        let good = Witness::new().with("x", (0..8u64).map(FieldElement::from).collect());
        assert!(audit(&spec, &good).iter().all(QueryVerdict::passed));

        let bad = Witness::new().with(
            "x",
            [0u64, 1, 2, 2, 4, 5, 6, 7].into_iter().map(FieldElement::from).collect(),
        );
        let report = audit(&spec, &bad);
        let step = report.iter().find(|verdict| verdict.query == "counter-step").unwrap();
        assert_eq!(
            step.failure.as_deref(),
            Some(QueryFailure::GlobalRow { row: 3 }.to_string().as_str())
        );
        assert!(report.iter().find(|verdict| verdict.query == "starts-at-zero").unwrap().passed());
    }
}
