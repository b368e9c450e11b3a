use num_bigint::BigUint;

/// Source of decimal digits for generated identifiers.
pub trait Hasher {
    /// Hashes `input` and returns the digest as a string of decimal digits.
    fn hash(&self, input: &str) -> String;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blake3Hasher;

impl Blake3Hasher {
    pub fn new() -> Self {
        Self {}
    }
}

impl Hasher for Blake3Hasher {
    fn hash(&self, input: &str) -> String {
        let hash = blake3::hash(input.as_bytes());
        BigUint::from_bytes_be(hash.as_bytes()).to_string()
    }
}
