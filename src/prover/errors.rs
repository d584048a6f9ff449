use crate::fft::{CodecError, FftError};
use crate::iop::{ColumnKind, QueryFailure};
use crate::merkle::MerkleError;
use crate::transcript::TranscriptError;

/// Reasons a proof attempt is aborted. No partial proof is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    #[error("column `{name}` was not assigned in round {round}")]
    MissingColumn { name: String, round: usize },
    #[error("no witness column is named `{name}`")]
    UnknownColumn { name: String },
    #[error("column `{name}` expects {expected} values, got {got}")]
    WrongLength {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("column `{name}` belongs to round {column_round}, the prover is in round {round}")]
    WrongRound {
        name: String,
        column_round: usize,
        round: usize,
    },
    #[error("column `{name}` is already assigned")]
    AlreadyAssigned { name: String },
    #[error("column `{name}` of kind {kind:?} is not supplied by the witness")]
    NotAssignable { name: String, kind: ColumnKind },
    #[error("coin `{name}` is not available")]
    MissingCoin { name: String },
    #[error("result of query `{name}` is not available")]
    MissingParams { name: String },
    #[error("digest slot `{name}` is not filled")]
    MissingDigests { name: String },
    #[error("query `{query}` is violated: {failure}")]
    QueryViolated { query: String, failure: QueryFailure },
    #[error("estimated {estimated} committed cells exceed the limit of {limit}")]
    ResourceLimit { estimated: u64, limit: u64 },
    #[error("{action}: {reason}")]
    Action { action: &'static str, reason: String },
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Fft(#[from] FftError),
}

impl AssignmentError {
    pub(crate) fn action(action: &'static str, reason: impl Into<String>) -> Self {
        AssignmentError::Action {
            action,
            reason: reason.into(),
        }
    }
}
