use serde::{Deserialize, Serialize};

/// Domain-separated transcript labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranscriptLabel {
    Setup,
    ColumnCommitment,
    Message,
    Digest,
    QueryParams,
    Coin,
}

impl TranscriptLabel {
    /// Fixed 16-byte tag mixed into every hash invocation.
    pub fn domain_tag(self) -> [u8; 16] {
        match self {
            TranscriptLabel::Setup => *b"WZ_LABEL_SETUP__",
            TranscriptLabel::ColumnCommitment => *b"WZ_LABEL_COLCOMM",
            TranscriptLabel::Message => *b"WZ_LABEL_MESSAGE",
            TranscriptLabel::Digest => *b"WZ_LABEL_DIGEST_",
            TranscriptLabel::QueryParams => *b"WZ_LABEL_QPARAMS",
            TranscriptLabel::Coin => *b"WZ_LABEL_COIN___",
        }
    }
}

/// Entry of the optional audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptEvent {
    Absorb {
        round: usize,
        label: TranscriptLabel,
        name: String,
    },
    Draw {
        round: usize,
        name: String,
    },
    Advance {
        round: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("payload of round {got} absorbed while the transcript is at round {expected}")]
    RoundMismatch { expected: usize, got: usize },
    #[error("coin of round {round} drawn after round {round} data was absorbed")]
    LateChallenge { round: usize },
    #[error("integer coin requested with an empty range")]
    RangeZero,
}
