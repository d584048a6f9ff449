use super::types::{HashFamily, LimitParams, RecursionParams, SecurityBudget, TranscriptParams, VortexParams};
use super::{CompilerParams, ParamsError};

/// Builder used to assemble [`CompilerParams`] with validation.
///
/// | Field | Default |
/// |-------|---------|
/// | `params_version` | `1` |
/// | `vortex` | Blow-up `2`, Blake2s Merkle trees, width from data, derived spot checks |
/// | `security` | Target `128` bits |
/// | `recursion` | `0` levels |
/// | `limits` | `64` rounds, `2^32` committed cells |
/// | `transcript` | Protocol tag `0x575a_5244_5f49_4f50` |
#[derive(Debug, Clone)]
pub struct CompilerParamsBuilder {
    pub params_version: u16,
    pub vortex: VortexParams,
    pub security: SecurityBudget,
    pub recursion: RecursionParams,
    pub limits: LimitParams,
    pub transcript: TranscriptParams,
}

impl CompilerParamsBuilder {
    /// Returns a builder initialised with safe defaults.
    pub fn new() -> Self {
        Self::from_profile(BuiltinProfile::STANDARD_X2)
    }

    /// Loads one of the built-in profiles.
    ///
    /// | Profile | Blowup | Merkle hash | Target bits | Spot checks | Recursion |
    /// |---------|--------|-------------|-------------|-------------|-----------|
    /// | `STANDARD_X2` | 2 | Blake2s | 128 | 256 | 0 |
    /// | `COMPACT_X4` | 4 | Blake2s | 128 | 128 | 0 |
    /// | `RECURSIVE_X4` | 4 | MiMC | 128 | 128 | 1 |
    /// | `TEST_FAST` | 4 | MiMC | 8 | 8 | 0 |
    ///
    /// `TEST_FAST` exists for tests and benches only; its soundness is
    /// deliberately tiny.
    pub fn from_profile(profile: BuiltinProfile) -> Self {
        let base = CompilerParamsBuilder {
            params_version: 1,
            vortex: VortexParams {
                blowup: 2,
                merkle_hash: HashFamily::Blake2s,
                matrix_width: None,
                num_opened: None,
            },
            security: SecurityBudget { target_bits: 128 },
            recursion: RecursionParams { levels: 0 },
            limits: LimitParams {
                round_budget: 64,
                max_committed_cells: 1 << 32,
            },
            transcript: TranscriptParams {
                protocol_tag: 0x575a_5244_5f49_4f50,
            },
        };
        match profile {
            BuiltinProfile::STANDARD_X2 => base,
            BuiltinProfile::COMPACT_X4 => CompilerParamsBuilder {
                vortex: VortexParams {
                    blowup: 4,
                    ..base.vortex
                },
                ..base
            },
            BuiltinProfile::RECURSIVE_X4 => CompilerParamsBuilder {
                vortex: VortexParams {
                    blowup: 4,
                    merkle_hash: HashFamily::Mimc,
                    ..base.vortex
                },
                recursion: RecursionParams { levels: 1 },
                ..base
            },
            BuiltinProfile::TEST_FAST => CompilerParamsBuilder {
                vortex: VortexParams {
                    blowup: 4,
                    merkle_hash: HashFamily::Mimc,
                    ..base.vortex
                },
                security: SecurityBudget { target_bits: 8 },
                limits: LimitParams {
                    round_budget: 64,
                    max_committed_cells: 1 << 24,
                },
                ..base
            },
        }
    }

    pub fn blowup(mut self, blowup: u32) -> Self {
        self.vortex.blowup = blowup;
        self
    }

    pub fn merkle_hash(mut self, family: HashFamily) -> Self {
        self.vortex.merkle_hash = family;
        self
    }

    pub fn target_bits(mut self, bits: u16) -> Self {
        self.security.target_bits = bits;
        self
    }

    pub fn spot_checks(mut self, count: u32) -> Self {
        self.vortex.num_opened = Some(count);
        self
    }

    pub fn matrix_width(mut self, width: u32) -> Self {
        self.vortex.matrix_width = Some(width);
        self
    }

    pub fn self_recursion_levels(mut self, levels: u8) -> Self {
        self.recursion.levels = levels;
        self
    }

    pub fn round_budget(mut self, rounds: u32) -> Self {
        self.limits.round_budget = rounds;
        self
    }

    pub fn max_committed_cells(mut self, cells: u64) -> Self {
        self.limits.max_committed_cells = cells;
        self
    }

    /// Validates the builder fields and emits a [`CompilerParams`] instance.
    pub fn build(&self) -> Result<CompilerParams, ParamsError> {
        CompilerParams::try_from_builder(self)
    }
}

/// Supported built-in profiles.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProfile {
    /// Rate 1/2, byte hash, no recursion.
    STANDARD_X2,
    /// Rate 1/4, byte hash, no recursion.
    COMPACT_X4,
    /// Rate 1/4, field-native hash, one self-recursion level.
    RECURSIVE_X4,
    /// Low-soundness profile for tests and benches.
    TEST_FAST,
}

impl Default for CompilerParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
