use super::types::{Proof, PROOF_VERSION};
use crate::iop::QueryParams;
use crate::ser::{
    ensure_consumed, read_digest, read_felt_vec, read_u8, read_vec, write_digest, write_felt_vec, write_u8,
    write_vec, ByteReader, SerError, SerKind, SerResult,
};
use crate::utils::ProofBytes;

/// Encodes a proof into its canonical bytes.
pub fn serialize_proof(proof: &Proof) -> SerResult<ProofBytes> {
    let mut out = Vec::new();
    write_u8(&mut out, proof.version);
    write_digest(&mut out, &proof.spec_digest);
    write_vec(
        &mut out,
        &proof.column_commitments,
        SerKind::ColumnCommitments,
        "commitments",
        |out, digest| {
            write_digest(out, digest);
            Ok(())
        },
    )?;
    write_vec(&mut out, &proof.messages, SerKind::Messages, "messages", |out, values| {
        write_felt_vec(out, values, SerKind::Messages, "message")
    })?;
    write_vec(&mut out, &proof.digests, SerKind::Digests, "slots", |out, digests| {
        write_vec(out, digests, SerKind::Digests, "slot", |out, digest| {
            write_digest(out, digest);
            Ok(())
        })
    })?;
    write_vec(&mut out, &proof.params, SerKind::QueryParams, "params", |out, params| {
        write_felt_vec(out, &params.values, SerKind::QueryParams, "values")
    })?;
    Ok(ProofBytes::new(out))
}

/// Decodes a proof, rejecting unknown versions, non-canonical field
/// elements and trailing bytes.
pub fn deserialize_proof(bytes: &[u8]) -> SerResult<Proof> {
    let mut cursor = ByteReader::new(bytes);
    let version = read_u8(&mut cursor, SerKind::Proof, "version")?;
    if version != PROOF_VERSION {
        return Err(SerError::invalid_value(SerKind::Proof, "version"));
    }
    let spec_digest = read_digest(&mut cursor, SerKind::Proof, "spec_digest")?;
    let column_commitments = read_vec(&mut cursor, SerKind::ColumnCommitments, "commitments", |cursor, _| {
        read_digest(cursor, SerKind::ColumnCommitments, "commitment")
    })?;
    let messages = read_vec(&mut cursor, SerKind::Messages, "messages", |cursor, _| {
        read_felt_vec(cursor, SerKind::Messages, "message")
    })?;
    let digests = read_vec(&mut cursor, SerKind::Digests, "slots", |cursor, _| {
        read_vec(cursor, SerKind::Digests, "slot", |cursor, _| {
            read_digest(cursor, SerKind::Digests, "digest")
        })
    })?;
    let params = read_vec(&mut cursor, SerKind::QueryParams, "params", |cursor, _| {
        read_felt_vec(cursor, SerKind::QueryParams, "values").map(QueryParams::new)
    })?;
    ensure_consumed(&cursor, SerKind::Proof)?;
    Ok(Proof {
        version,
        spec_digest,
        column_commitments,
        messages,
        digests,
        params,
    })
}

impl Proof {
    pub fn to_bytes(&self) -> SerResult<ProofBytes> {
        serialize_proof(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> SerResult<Self> {
        deserialize_proof(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;
    use crate::merkle::Digest;

    fn sample() -> Proof {
        Proof {
            version: PROOF_VERSION,
            spec_digest: Digest([7u8; 32]),
            column_commitments: vec![Digest([1u8; 32])],
            messages: vec![vec![FieldElement::from(3u64); 4], Vec::new()],
            digests: vec![vec![Digest([2u8; 32]), Digest([3u8; 32])]],
            params: vec![QueryParams::new(vec![FieldElement::from(9u64)])],
        }
    }

    #[test]
    fn proof_bytes_roundtrip() {
        let proof = sample();
        let bytes = serialize_proof(&proof).unwrap();
        assert_eq!(deserialize_proof(bytes.as_slice()).unwrap(), proof);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = serialize_proof(&sample()).unwrap().into_vec();
        bytes.push(0);
        assert!(matches!(
            deserialize_proof(&bytes),
            Err(SerError::TrailingBytes { .. })
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = serialize_proof(&sample()).unwrap().into_vec();
        for cut in [0, 1, 33, bytes.len() - 1] {
            assert!(deserialize_proof(&bytes[..cut]).is_err());
        }
    }

    #[test]
    fn non_canonical_field_elements_are_rejected() {
        let mut bytes = serialize_proof(&sample()).unwrap().into_vec();
        // First message value starts after version, digest, one commitment
        // and the two length prefixes.
        let offset = 1 + 32 + 4 + 32 + 4 + 4;
        bytes[offset..offset + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            deserialize_proof(&bytes),
            Err(SerError::InvalidValue { .. })
        ));
    }
}
