use super::types::{HashFamily, LimitParams, RecursionParams, SecurityBudget, TranscriptParams, VortexParams};
use super::validate::{validate, ParamsError};
use super::CompilerParams;
use crate::ser::{
    ensure_consumed, read_option, read_u32, read_u64, read_u8, write_option, write_u32, write_u64, write_u8,
    ByteReader, SerError, SerKind, SerResult,
};

/// Canonical binary serialisation for [`CompilerParams`].
///
/// | Field | Encoding |
/// |-------|----------|
/// | `params_version` | `u16` little-endian |
/// | `vortex.blowup` | `u32` |
/// | `vortex.merkle_hash` | `u8` discriminant |
/// | `vortex.matrix_width` | option tag + `u32` |
/// | `vortex.num_opened` | option tag + `u32` |
/// | `security.target_bits` | `u16` |
/// | `recursion.levels` | `u8` |
/// | `limits.round_budget` | `u32` |
/// | `limits.max_committed_cells` | `u64` |
/// | `transcript.protocol_tag` | `u64` |
///
/// Byte-for-byte equality implies identical parameter sets.
pub fn serialize_params(params: &CompilerParams) -> Vec<u8> {
    let mut out = Vec::with_capacity(48);
    out.extend_from_slice(&params.params_version.to_le_bytes());
    write_u32(&mut out, params.vortex.blowup);
    write_u8(&mut out, params.vortex.merkle_hash.code());
    // Option writers only fail through their closures, which are infallible here.
    let _ = write_option(&mut out, &params.vortex.matrix_width, |out, w| {
        write_u32(out, *w);
        Ok(())
    });
    let _ = write_option(&mut out, &params.vortex.num_opened, |out, t| {
        write_u32(out, *t);
        Ok(())
    });
    out.extend_from_slice(&params.security.target_bits.to_le_bytes());
    write_u8(&mut out, params.recursion.levels);
    write_u32(&mut out, params.limits.round_budget);
    write_u64(&mut out, params.limits.max_committed_cells);
    write_u64(&mut out, params.transcript.protocol_tag);
    out
}

fn read_u16(cursor: &mut ByteReader<'_>, field: &'static str) -> SerResult<u16> {
    cursor.read_array::<2>(SerKind::Params, field).map(u16::from_le_bytes)
}

/// Decodes and validates a canonical parameter encoding.
pub fn deserialize_params(bytes: &[u8]) -> Result<CompilerParams, ParamsError> {
    let kind = SerKind::Params;
    let mut cursor = ByteReader::new(bytes);
    let params_version = read_u16(&mut cursor, "params_version")?;
    let blowup = read_u32(&mut cursor, kind, "vortex.blowup")?;
    let merkle_hash = HashFamily::from_code(read_u8(&mut cursor, kind, "vortex.merkle_hash")?)
        .ok_or(SerError::invalid_value(kind, "vortex.merkle_hash"))?;
    let matrix_width = read_option(&mut cursor, kind, "vortex.matrix_width", |c| {
        read_u32(c, kind, "vortex.matrix_width")
    })?;
    let num_opened = read_option(&mut cursor, kind, "vortex.num_opened", |c| {
        read_u32(c, kind, "vortex.num_opened")
    })?;
    let target_bits = read_u16(&mut cursor, "security.target_bits")?;
    let levels = read_u8(&mut cursor, kind, "recursion.levels")?;
    let round_budget = read_u32(&mut cursor, kind, "limits.round_budget")?;
    let max_committed_cells = read_u64(&mut cursor, kind, "limits.max_committed_cells")?;
    let protocol_tag = read_u64(&mut cursor, kind, "transcript.protocol_tag")?;
    ensure_consumed(&cursor, kind)?;

    let params = CompilerParams {
        params_version,
        vortex: VortexParams {
            blowup,
            merkle_hash,
            matrix_width,
            num_opened,
        },
        security: SecurityBudget { target_bits },
        recursion: RecursionParams { levels },
        limits: LimitParams {
            round_budget,
            max_committed_cells,
        },
        transcript: TranscriptParams { protocol_tag },
    };
    validate(&params)?;
    Ok(params)
}
