use super::column::ColumnKind;

/// Rejections raised while registering columns, coins and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("name `{name}` is already registered")]
    DuplicateName { name: String },
    #[error("column `{name}` has size {size}, sizes must be non-zero powers of two")]
    InvalidSize { name: String, size: usize },
    #[error("`{name}` references `{dependency}` of round {dependency_round}, which is later than round {round}")]
    RoundOrder {
        name: String,
        dependency: String,
        dependency_round: usize,
        round: usize,
    },
    #[error("`{name}` references unknown {what}")]
    UnknownReference { name: String, what: &'static str },
    #[error("query `{name}` mixes column sizes {left} and {right}")]
    SizeMismatch { name: String, left: usize, right: usize },
    #[error("query `{name}` has mismatched lengths: {detail}")]
    ShapeMismatch { name: String, detail: String },
    #[error("query `{name}` does not reference any column")]
    EmptyQuery { name: String },
    #[error("coin `{name}` is invalid: {detail}")]
    InvalidCoin { name: String, detail: String },
    #[error("query `{name}` uses coin `{coin}`, which is not a field coin")]
    CoinKind { name: String, coin: String },
    #[error("column `{name}` of kind {kind:?} cannot be used here")]
    ColumnKind { name: String, kind: ColumnKind },
    #[error("position {position} is outside column `{name}` of size {size}")]
    PositionOutOfRange { name: String, position: usize, size: usize },
    #[error("precomputed column `{name}` has {got} values, expected {expected}")]
    PrecomputedLength { name: String, expected: usize, got: usize },
}
