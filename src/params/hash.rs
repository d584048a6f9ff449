use crate::hash::Hasher;

use super::ser::serialize_params;
use super::CompilerParams;

const PARAMS_DOMAIN_TAG: &[u8] = b"rpp-wizard:params:v1";

/// Computes the canonical parameter digest: Blake2s over a domain tag and
/// the canonical serialization.
pub fn params_hash(params: &CompilerParams) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update_framed(PARAMS_DOMAIN_TAG);
    hasher.update_framed(&serialize_params(params));
    hasher.finalize().into_bytes()
}
