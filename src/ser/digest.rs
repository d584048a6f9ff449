use super::cursor::ByteReader;
use super::error::{SerKind, SerResult};
use crate::merkle::{Digest, DIGEST_SIZE};

pub fn write_digest(out: &mut Vec<u8>, digest: &Digest) {
    out.extend_from_slice(digest.as_bytes());
}

pub fn read_digest(cursor: &mut ByteReader<'_>, kind: SerKind, field: &'static str) -> SerResult<Digest> {
    cursor.read_array::<DIGEST_SIZE>(kind, field).map(Digest)
}
