//! Opaque byte container for serialized proofs.

/// Wrapper around proof bytes ensuring explicit conversions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProofBytes {
    /// Raw proof representation.
    bytes: Vec<u8>,
}

impl ProofBytes {
    /// Creates a new proof byte container.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the underlying byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for ProofBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
