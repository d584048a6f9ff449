//! Interactive oracle proof model: registries, queries and the
//! [`Specification`] that compiler passes transform.
//!
//! Rounds are numbered from zero. In round `r` the prover first receives the
//! coins of round `r` (none in round 0), then assigns the columns of round
//! `r`; what it sends (commitments, clear columns, digests, query results)
//! is absorbed before the coins of round `r + 1` are drawn.

pub mod builder;
pub mod check;
pub mod coin;
pub mod column;
pub mod errors;
pub mod expr;
mod fingerprint;
pub mod ids;
pub mod persist;
pub mod query;
pub mod specification;

pub use builder::Builder;
pub use check::{check_query, compute_params, materialize_verifier_column, resolve_point, Assignment, QueryFailure};
pub use coin::{CoinInfo, CoinKind, CoinRegistry, CoinValue};
pub use column::{ColumnInfo, ColumnKind, ColumnOrigin, ColumnRegistry, VerifierColumn};
pub use errors::DefinitionError;
pub use expr::{rotate, Expr};
pub use ids::{CoinId, ColumnId, QueryId, SlotId};
pub use persist::PersistError;
pub use query::{
    EvalPoint, GlobalConstraint, Inclusion, InnerProduct, LocalConstraint, LocalOpening, Permutation, Query,
    QueryInfo, QueryParams, QueryRegistry, QueryStatus, Range, UnivariateEval,
};
pub use specification::{DigestSlot, SlotVisibility, Specification};
