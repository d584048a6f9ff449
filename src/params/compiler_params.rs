use serde::{Deserialize, Serialize};

use super::hash::params_hash;
use super::types::{HashFamily, LimitParams, RecursionParams, SecurityBudget, TranscriptParams, VortexParams};
use super::validate::{validate, ParamsError};
use super::CompilerParamsBuilder;

/// Matrix width cap used when the parameters leave it open.
pub const DEFAULT_MAX_MATRIX_WIDTH: usize = 1 << 10;

/// Canonical compiler parameter set shared by prover and verifier.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `params_version` | `u16` | Version of the parameter schema. |
/// | `vortex` | [`VortexParams`] | Commitment encoding options. |
/// | `security` | [`SecurityBudget`] | Target soundness. |
/// | `recursion` | [`RecursionParams`] | Self-recursion depth. |
/// | `limits` | [`LimitParams`] | Round budget and estimator ceiling. |
/// | `transcript` | [`TranscriptParams`] | Fiat-Shamir framing. |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerParams {
    pub(crate) params_version: u16,
    pub(crate) vortex: VortexParams,
    pub(crate) security: SecurityBudget,
    pub(crate) recursion: RecursionParams,
    pub(crate) limits: LimitParams,
    pub(crate) transcript: TranscriptParams,
}

impl CompilerParams {
    pub(crate) fn try_from_builder(builder: &CompilerParamsBuilder) -> Result<Self, ParamsError> {
        let params = Self {
            params_version: builder.params_version,
            vortex: builder.vortex,
            security: builder.security,
            recursion: builder.recursion,
            limits: builder.limits,
            transcript: builder.transcript,
        };
        validate(&params)?;
        Ok(params)
    }

    pub const fn params_version(&self) -> u16 {
        self.params_version
    }

    pub const fn vortex(&self) -> &VortexParams {
        &self.vortex
    }

    pub fn blowup(&self) -> usize {
        self.vortex.blowup as usize
    }

    pub const fn merkle_hash(&self) -> HashFamily {
        self.vortex.merkle_hash
    }

    pub fn matrix_width(&self) -> Option<usize> {
        self.vortex.matrix_width.map(|w| w as usize)
    }

    /// Widest Vortex matrix; longer columns are split into several rows.
    pub fn max_matrix_width(&self) -> usize {
        self.matrix_width().unwrap_or(DEFAULT_MAX_MATRIX_WIDTH)
    }

    pub const fn security(&self) -> &SecurityBudget {
        &self.security
    }

    pub fn self_recursion_levels(&self) -> usize {
        self.recursion.levels as usize
    }

    pub fn round_budget(&self) -> usize {
        self.limits.round_budget as usize
    }

    pub const fn max_committed_cells(&self) -> u64 {
        self.limits.max_committed_cells
    }

    pub const fn protocol_tag(&self) -> u64 {
        self.transcript.protocol_tag
    }

    /// Number of spot-checked codeword positions.
    ///
    /// Unless overridden, `t = ceil(2 * target_bits / log2(blowup))`: each
    /// check on a word far from the code passes with probability at most
    /// about `rate^(1/2)`.
    pub fn spot_checks(&self) -> usize {
        if let Some(explicit) = self.vortex.num_opened {
            return explicit as usize;
        }
        let log_blowup = (self.vortex.blowup.max(2)).trailing_zeros() as usize;
        let target = self.security.target_bits as usize;
        (2 * target).div_ceil(log_blowup)
    }

    /// Returns the canonical digest of the parameter set.
    pub fn params_hash(&self) -> [u8; 32] {
        params_hash(self)
    }

    /// Copy of the parameters with a different recursion depth.
    pub fn with_recursion_levels(&self, levels: u8) -> Result<Self, ParamsError> {
        let mut params = self.clone();
        params.recursion.levels = levels;
        validate(&params)?;
        Ok(params)
    }
}
