use crate::iop::QueryFailure;
use crate::merkle::MerkleError;
use crate::transcript::TranscriptError;

/// Why a proof was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("query is still pending, no pass compiled it")]
    Uncompiled,
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error(transparent)]
    Query(#[from] QueryFailure),
    #[error("quotient identity does not hold for {members:?}")]
    GlobalIdentity { members: Vec<String> },
    #[error("grand products do not match")]
    PermutationProduct,
    #[error("log-derivative sums do not match")]
    LookupSum,
    #[error("running sum does not close on claimed result {index}")]
    InnerProduct { index: usize },
    #[error("boundary identity does not vanish")]
    LocalConstraint,
    #[error("opened value differs from the evaluation claim")]
    OpeningMismatch,
    #[error("multi-point quotient does not match the claims")]
    MultiPoint,
    #[error("evaluation point collides with a claimed point")]
    DegeneratePoint,
    #[error("spot check {spot}: opened entries are inconsistent with the combined row")]
    LinearCombination { spot: usize },
    #[error("spot check {spot}: Merkle path of matrix {matrix} rejected: {error}")]
    MerklePath {
        spot: usize,
        matrix: usize,
        error: MerkleError,
    },
    #[error("combined row does not evaluate to the combined claims")]
    CombinedClaim,
    #[error("public column `{column}` does not evaluate to its claim")]
    PublicEval { column: String },
    #[error("chunk evaluations of `{column}` do not recombine to its claim")]
    ChunkRecombination { column: String },
    #[error("combined row cannot be encoded")]
    Codec,
}

/// Rejection verdict attributed to one query (or compiler artefact).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("verification failed on `{query}`: {reason}")]
pub struct VerificationError {
    pub query: String,
    pub reason: VerificationFailure,
}

impl VerificationError {
    pub fn new(query: impl Into<String>, reason: impl Into<VerificationFailure>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(what, VerificationFailure::MalformedProof(detail.into()))
    }
}
