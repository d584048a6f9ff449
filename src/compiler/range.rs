//! Range checks as lookups into a shared table.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::{CompileError, CompileErrorKind, CompilerPass};
use crate::field::FieldElement;
use crate::iop::{ColumnId, Inclusion, Query, QueryId, Specification};
use crate::utils::next_power_of_two;

/// Largest bound backed by a precomputed table.
pub const MAX_RANGE_BOUND: u64 = 1 << 24;

/// Rewrites `Range { column, bound }` as `column ⊂ [0, bound)`, the table
/// being a precomputed column holding `0..bound` (zero padded).
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeLowering;

impl CompilerPass for RangeLowering {
    fn name(&self) -> &'static str {
        "range"
    }

    #[instrument(level = "debug", skip_all, fields(pass = "range"))]
    fn compile(&self, mut spec: Specification) -> Result<Specification, CompileError> {
        let pending: Vec<(QueryId, String, usize, ColumnId, u64)> = spec
            .queries()
            .pending()
            .filter_map(|(id, info)| match &info.query {
                Query::Range(range) => Some((id, info.name.clone(), info.round, range.column, range.bound)),
                _ => None,
            })
            .collect();

        let mut tables: BTreeMap<u64, ColumnId> = BTreeMap::new();
        for (id, name, round, column, bound) in pending {
            if bound > MAX_RANGE_BOUND {
                return Err(CompileError::on_query(
                    self.name(),
                    &name,
                    CompileErrorKind::Unsupported("range bound above 2^24"),
                ));
            }
            let table = match tables.get(&bound) {
                Some(table) => *table,
                None => {
                    let table_name = format!("RANGE_TABLE_{bound}");
                    let table = match spec.column_id(&table_name) {
                        Some(existing) if spec.precomputed(existing).is_some() => existing,
                        _ => {
                            let size = next_power_of_two(bound as usize);
                            let mut values: Vec<FieldElement> = (0..bound).map(FieldElement::new).collect();
                            values.resize(size, FieldElement::ZERO);
                            let fresh = spec.fresh_name(&table_name);
                            spec.register_precomputed(fresh, Arc::new(values))
                                .map_err(|error| CompileError::on_query(self.name(), &name, error))?
                        }
                    };
                    tables.insert(bound, table);
                    table
                }
            };
            let lookup = spec.fresh_name(&format!("{name}_RANGE"));
            spec.register_query(
                lookup,
                round,
                Query::Inclusion(Inclusion {
                    included: vec![column],
                    including: vec![table],
                    filter: None,
                }),
            )
            .map_err(|error| CompileError::on_query(self.name(), &name, error))?;
            spec.mark_compiled(id, self.name());
        }
        debug!(tables = tables.len(), "range checks lowered");
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::{Builder, ColumnKind};

    #[test]
    fn ranges_with_equal_bounds_share_a_table() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 8)?;
            let y = b.commit("y", 8)?;
            b.range("x-small", x, 10)?;
            b.range("y-small", y, 10)?;
            Ok(())
        })
        .unwrap();
        let lowered = RangeLowering.compile(spec).unwrap();
        let table = lowered.column_id("RANGE_TABLE_10").unwrap();
        let info = lowered.columns().get(table).unwrap();
        assert_eq!(info.kind, ColumnKind::Precomputed);
        assert_eq!(info.size, 16);
        assert_eq!(lowered.precomputed(table).unwrap()[9], FieldElement::from(9u64));
        let inclusions = lowered
            .queries()
            .pending()
            .filter(|(_, info)| matches!(info.query, Query::Inclusion(_)))
            .count();
        assert_eq!(inclusions, 2);
    }

    #[test]
    fn oversized_bounds_are_rejected() {
        let spec = Builder::define(|b| {
            let x = b.commit("x", 8)?;
            b.range("huge", x, MAX_RANGE_BOUND + 1)?;
            Ok(())
        })
        .unwrap();
        let error = RangeLowering.compile(spec).unwrap_err();
        assert_eq!(error.query.as_deref(), Some("huge"));
    }
}
