//! Local constraints become openings of the referenced positions.
//!
//! Row 0 of `C(shift)` reads position `shift mod n`; the verifier evaluates
//! the expression on the opened values.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::actions::VerifierAction;
use super::{CompileError, CompilerPass};
use crate::iop::{
    ColumnId, DefinitionError, Expr, LocalConstraint, LocalOpening, Query, QueryFailure, QueryId, Specification,
};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCtx {
    pub query: String,
    pub expr: Expr,
    /// `(column, position, opening)` per distinct reference.
    pub openings: Vec<(ColumnId, usize, QueryId)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLowering;

impl CompilerPass for LocalLowering {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "local"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, String, usize, LocalConstraint)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::Local(q) => Some((id, info.name.clone(), info.round, q.clone())),
                _ => None,
            })
            .collect();
        let count = pending.len();
        for (id, name, round, constraint) in pending {
            lower(&mut spec, &name, round, constraint)
                .map_err(|error| CompileError::on_query(self.name(), &name, error))?;
            spec.mark_compiled(id, self.name());
        }
        debug!(queries = count, "local constraints lowered");
        Ok(spec)
    }
}

fn position(shift: isize, size: usize) -> usize {
    shift.rem_euclid(size as isize) as usize
}

fn lower(spec: &mut Specification, name: &str, round: usize, constraint: LocalConstraint) -> Result<(), DefinitionError> {
    let mut openings: Vec<(ColumnId, usize, QueryId)> = Vec::new();
    for (column, shift) in constraint.expr.column_refs() {
        let pos = position(shift, spec.columns().info(column).size);
        if openings.iter().any(|(c, p, _)| *c == column && *p == pos) {
            continue;
        }
        let opening = spec.register_query(
            spec.fresh_name(&format!("{name}_OPEN_{}_{pos}", column.index())),
            round,
            Query::LocalOpening(LocalOpening { column, position: pos }),
        )?;
        openings.push((column, pos, opening));
    }
    let ctx = Arc::new(LocalCtx {
        query: name.to_owned(),
        expr: constraint.expr,
        openings,
    });
    spec.push_verifier_action(round, VerifierAction::LocalConstraint(ctx));
    Ok(())
}

impl LocalCtx {
    pub(crate) fn check(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        let spec = rt.spec();
        let value = self.expr.evaluate::<VerificationError>(
            &mut |column, shift| {
                let pos = position(shift, spec.columns().info(column).size);
                let opening = self
                    .openings
                    .iter()
                    .find(|(c, p, _)| *c == column && *p == pos)
                    .map(|(_, _, opening)| *opening)
                    .ok_or_else(|| {
                        VerificationError::new(
                            self.query.clone(),
                            QueryFailure::MissingColumn(spec.columns().info(column).name.clone()),
                        )
                    })?;
                rt.read_param(&self.query, opening, 0)
            },
            &mut |coin| rt.read_field_coin(&self.query, coin),
        )?;
        if value.is_zero() {
            Ok(())
        } else {
            Err(VerificationError::new(self.query.clone(), VerificationFailure::LocalConstraint))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::Builder;

    #[test]
    fn wrapping_shifts_share_an_opening() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 4)?;
            b.local(
                "ends",
                Expr::column(x) + Expr::shifted(x, -1) - Expr::shifted(x, 3),
            )?;
            Ok(())
        })
        .unwrap();
        let lowered = LocalLowering.compile(spec).unwrap();
        let openings: Vec<usize> = lowered
            .queries()
            .pending()
            .filter_map(|(_, info)| match &info.query {
                Query::LocalOpening(q) => Some(q.position),
                _ => None,
            })
            .collect();
        assert_eq!(openings, vec![3, 0]);
    }
}
