use core::fmt;

use blake2::{Blake2s256, Digest};

use crate::field::FieldElement;

/// Internal deterministic hash value produced by the canonical helper.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash {
    bytes: [u8; 32],
}

impl Hash {
    /// Constructs a hash value from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Returns the canonical byte representation of the digest.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Consumes the hash and returns the underlying byte array.
    pub const fn into_bytes(self) -> [u8; 32] {
        self.bytes
    }

    /// Returns a helper that formats the digest as lowercase hexadecimal.
    pub fn to_hex(&self) -> HexOutput {
        HexOutput(self.bytes)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(hash: Hash) -> Self {
        hash.into_bytes()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", self.to_hex())
    }
}

/// Hexadecimal representation of a deterministic digest.
#[derive(Clone, Copy)]
pub struct HexOutput([u8; 32]);

impl fmt::Display for HexOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HexOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Streaming Blake2s-256 hasher with helpers for length-framed input.
#[derive(Clone, Default)]
pub struct Hasher {
    state: Blake2s256,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            state: Blake2s256::new(),
        }
    }

    /// Absorbs raw bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        Digest::update(&mut self.state, bytes);
    }

    pub fn update_u64(&mut self, value: u64) {
        self.update(&value.to_le_bytes());
    }

    /// Absorbs `u64_le(len) || bytes` so adjacent fields cannot be confused.
    pub fn update_framed(&mut self, bytes: &[u8]) {
        self.update_u64(bytes.len() as u64);
        self.update(bytes);
    }

    /// Absorbs a length-prefixed sequence of canonical field elements.
    pub fn update_felts(&mut self, values: &[FieldElement]) {
        self.update_u64(values.len() as u64);
        for value in values {
            self.update(&value.0.to_le_bytes());
        }
    }

    pub fn finalize(self) -> Hash {
        Hash::from(<[u8; 32]>::from(self.state.finalize()))
    }
}

/// Computes the Blake2s-256 digest of `input`.
pub fn hash(input: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(input);
    hasher.finalize()
}

/// Digest of a domain tag followed by a framed vector of field elements.
pub fn hash_field_elements(domain: &[u8], values: &[FieldElement]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update_framed(domain);
    hasher.update_felts(values);
    hasher.finalize()
}

/// Blake2s-based extendable output stream: block `i` is
/// `Blake2s(state_{i} || u64_le(i))` and becomes the next state.
#[derive(Debug, Clone)]
pub struct Blake2sXof {
    state: [u8; 32],
    counter: u64,
}

impl Blake2sXof {
    /// Creates a new XOF instance from an arbitrary seed.
    pub fn new(seed: &[u8]) -> Self {
        let mut hasher = Blake2s256::new();
        Digest::update(&mut hasher, seed);
        Digest::update(&mut hasher, b"/XOF");
        Self {
            state: hasher.finalize().into(),
            counter: 0,
        }
    }

    /// Creates a new XOF starting from an existing 32-byte hash state.
    pub fn from_state(state: [u8; 32]) -> Self {
        Self { state, counter: 0 }
    }

    /// Returns the next 64 bits from the deterministic stream.
    pub fn next_u64(&mut self) -> u64 {
        let block = self.squeeze_block();
        let mut word = [0u8; 8];
        word.copy_from_slice(&block[..8]);
        u64::from_le_bytes(word)
    }

    /// Returns the next 32-byte block.
    pub fn next_block(&mut self) -> [u8; 32] {
        self.squeeze_block()
    }

    /// Fills the provided buffer with bytes from the stream.
    pub fn squeeze(&mut self, output: &mut [u8]) {
        for chunk in output.chunks_mut(32) {
            let block = self.squeeze_block();
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }

    fn squeeze_block(&mut self) -> [u8; 32] {
        let mut hasher = Blake2s256::new();
        Digest::update(&mut hasher, self.state);
        Digest::update(&mut hasher, self.counter.to_le_bytes());
        let block: [u8; 32] = hasher.finalize().into();
        self.state = block;
        self.counter = self.counter.wrapping_add(1);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_separates_adjacent_fields() {
        let mut a = Hasher::new();
        a.update_framed(b"ab");
        a.update_framed(b"c");
        let mut b = Hasher::new();
        b.update_framed(b"a");
        b.update_framed(b"bc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn xof_is_deterministic() {
        let mut x = Blake2sXof::new(b"seed");
        let mut y = Blake2sXof::new(b"seed");
        let mut out_x = [0u8; 70];
        let mut out_y = [0u8; 70];
        x.squeeze(&mut out_x);
        y.squeeze(&mut out_y);
        assert_eq!(out_x, out_y);
        assert_ne!(x.next_u64(), Blake2sXof::new(b"other").next_u64());
    }
}
