use core::fmt;
use serde::{Deserialize, Serialize};

/// Context markers used when reporting serialization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerKind {
    /// Top-level proof framing.
    Proof,
    /// Hash commitments of raw committed columns.
    ColumnCommitments,
    /// Columns sent in clear.
    Messages,
    /// Digest slots (Merkle roots and paths).
    Digests,
    /// Results of evaluation, inner-product and opening queries.
    QueryParams,
    /// Parameter set framing.
    Params,
}

impl fmt::Display for SerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerKind::Proof => write!(f, "proof"),
            SerKind::ColumnCommitments => write!(f, "column commitments"),
            SerKind::Messages => write!(f, "messages"),
            SerKind::Digests => write!(f, "digests"),
            SerKind::QueryParams => write!(f, "query params"),
            SerKind::Params => write!(f, "params"),
        }
    }
}

/// Canonical serialization error surfaced while encoding or decoding data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerError {
    #[error("{kind}: input ended while reading `{field}`")]
    UnexpectedEnd { kind: SerKind, field: &'static str },
    #[error("{kind}: invalid length for `{field}`")]
    InvalidLength { kind: SerKind, field: &'static str },
    #[error("{kind}: invalid value for `{field}`")]
    InvalidValue { kind: SerKind, field: &'static str },
    #[error("{kind}: {remaining} trailing bytes after offset {consumed}")]
    TrailingBytes {
        kind: SerKind,
        consumed: usize,
        remaining: usize,
    },
}

impl SerError {
    pub fn unexpected_end(kind: SerKind, field: &'static str) -> Self {
        SerError::UnexpectedEnd { kind, field }
    }

    pub fn invalid_length(kind: SerKind, field: &'static str) -> Self {
        SerError::InvalidLength { kind, field }
    }

    pub fn invalid_value(kind: SerKind, field: &'static str) -> Self {
        SerError::InvalidValue { kind, field }
    }

    pub fn trailing_bytes(kind: SerKind, consumed: usize, remaining: usize) -> Self {
        SerError::TrailingBytes {
            kind,
            consumed,
            remaining,
        }
    }

    /// Returns the serialization context associated with the error.
    pub fn kind(&self) -> SerKind {
        match *self {
            SerError::UnexpectedEnd { kind, .. }
            | SerError::InvalidLength { kind, .. }
            | SerError::InvalidValue { kind, .. }
            | SerError::TrailingBytes { kind, .. } => kind,
        }
    }
}

/// Convenient alias for serialization results.
pub type SerResult<T> = core::result::Result<T, SerError>;
