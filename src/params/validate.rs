use super::types::HashFamily;
use super::CompilerParams;

/// Error enumeration for parameter validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("blow-up factor {got} below the minimum {min}")]
    InvalidBlowup { min: u32, got: u32 },
    #[error("blow-up factor {got} is not a power of two")]
    BlowupNotPowerOfTwo { got: u32 },
    #[error("target soundness of {got} bits outside {min}..={max}")]
    SecurityBudgetOutOfRange { min: u16, max: u16, got: u16 },
    #[error("explicit spot-check count must be positive")]
    InvalidSpotChecks,
    #[error("matrix width {got} is not a power of two")]
    InvalidMatrixWidth { got: u32 },
    #[error("round budget must be positive")]
    InvalidRoundBudget,
    #[error("committed-cell limit must be positive")]
    InvalidCellLimit,
    #[error("self-recursion requires MiMC Merkle hashing, got {got:?}")]
    IncompatibleRecursionHash { got: HashFamily },
    #[error("transcript protocol tag must be non-zero")]
    InvalidProtocolTag,
    #[error("unsupported parameter schema version {got}")]
    UnsupportedVersion { got: u16 },
    #[error("parameter serialization failed: {0}")]
    Serialization(#[from] crate::ser::SerError),
}

const MIN_TARGET_BITS: u16 = 1;
const MAX_TARGET_BITS: u16 = 256;

/// Validates all parameter invariants.
pub fn validate(params: &CompilerParams) -> Result<(), ParamsError> {
    if params.params_version != 1 {
        return Err(ParamsError::UnsupportedVersion {
            got: params.params_version,
        });
    }
    validate_vortex(params)?;
    let bits = params.security.target_bits;
    if !(MIN_TARGET_BITS..=MAX_TARGET_BITS).contains(&bits) {
        return Err(ParamsError::SecurityBudgetOutOfRange {
            min: MIN_TARGET_BITS,
            max: MAX_TARGET_BITS,
            got: bits,
        });
    }
    if params.recursion.levels > 0 && params.vortex.merkle_hash != HashFamily::Mimc {
        return Err(ParamsError::IncompatibleRecursionHash {
            got: params.vortex.merkle_hash,
        });
    }
    if params.limits.round_budget == 0 {
        return Err(ParamsError::InvalidRoundBudget);
    }
    if params.limits.max_committed_cells == 0 {
        return Err(ParamsError::InvalidCellLimit);
    }
    if params.transcript.protocol_tag == 0 {
        return Err(ParamsError::InvalidProtocolTag);
    }
    Ok(())
}

fn validate_vortex(params: &CompilerParams) -> Result<(), ParamsError> {
    let vortex = &params.vortex;
    if vortex.blowup < 2 {
        return Err(ParamsError::InvalidBlowup {
            min: 2,
            got: vortex.blowup,
        });
    }
    if !vortex.blowup.is_power_of_two() {
        return Err(ParamsError::BlowupNotPowerOfTwo { got: vortex.blowup });
    }
    if vortex.num_opened == Some(0) {
        return Err(ParamsError::InvalidSpotChecks);
    }
    if let Some(width) = vortex.matrix_width {
        if !width.is_power_of_two() {
            return Err(ParamsError::InvalidMatrixWidth { got: width });
        }
    }
    Ok(())
}
