//! Local openings as evaluations at roots of unity.
//!
//! Entry `i` of a column of size `n` is its polynomial at `w_n^i`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::VerifierAction;
use super::{CompileError, CompileErrorKind, CompilerPass};
use crate::field::FieldElement;
use crate::iop::{EvalPoint, LocalOpening, Query, QueryId, Specification, UnivariateEval};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningCtx {
    pub query: String,
    pub opening: QueryId,
    pub eval: QueryId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpeningLowering;

impl CompilerPass for OpeningLowering {
    fn name(&self) -> &'static str {
        "opening"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "opening"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, String, usize, LocalOpening)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::LocalOpening(q) => Some((id, info.name.clone(), info.round, q.clone())),
                _ => None,
            })
            .collect();
        let count = pending.len();
        for (id, name, round, opening) in pending {
            let size = spec.columns().info(opening.column).size;
            let root = FieldElement::root_of_unity(size.trailing_zeros() as usize).ok_or_else(|| {
                CompileError::on_query(
                    self.name(),
                    &name,
                    CompileErrorKind::IrregularDimensions(format!("no root of unity of order {size}")),
                )
            })?;
            let eval = spec
                .register_query(
                    spec.fresh_name(&format!("{name}_EVAL")),
                    round,
                    Query::UnivariateEval(UnivariateEval {
                        columns: vec![opening.column],
                        point: EvalPoint::Constant(root.pow(opening.position as u64)),
                    }),
                )
                .map_err(|error| CompileError::on_query(self.name(), &name, error))?;
            spec.push_verifier_action(
                round,
                VerifierAction::OpeningConsistency(Arc::new(OpeningCtx {
                    query: name,
                    opening: id,
                    eval,
                })),
            );
            spec.mark_compiled(id, self.name());
        }
        debug!(queries = count, "openings lowered");
        Ok(spec)
    }
}

impl OpeningCtx {
    pub(crate) fn check(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let opened = rt.read_param(&self.query, self.opening, 0)?;
        let evaluated = rt.read_param(&self.query, self.eval, 0)?;
        if opened == evaluated {
            Ok(())
        } else {
            Err(VerificationError::new(self.query.clone(), VerificationFailure::OpeningMismatch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::Builder;

    #[test]
    fn opening_points_are_powers_of_the_domain_root() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 8)?;
            b.local_opening("x-last", x, 7)?;
            Ok(())
        })
        .unwrap();
        let lowered = OpeningLowering.compile(spec).unwrap();
        let eval = lowered.query_id("x-last_EVAL").unwrap();
        let info = lowered.queries().get(eval).unwrap();
        let root = FieldElement::root_of_unity(3).unwrap();
        match &info.query {
            Query::UnivariateEval(q) => assert_eq!(q.point, EvalPoint::Constant(root.pow(7))),
            other => panic!("unexpected query {other:?}"),
        }
        assert!(info.is_pending());
    }
}
