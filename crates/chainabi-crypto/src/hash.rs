//! Hash trait and Keccak-256 implementation

use chainabi_primitives::H256;
use sha3::{Digest, Keccak256 as Keccak256Core};

/// A pure, reentrant 256-bit hash function.
pub trait Hasher: Send + Sync {
    /// Hash `data` into a 32-byte digest.
    fn hash(&self, data: &[u8]) -> H256;
}

impl<F> Hasher for F
where
    F: Fn(&[u8]) -> H256 + Send + Sync,
{
    fn hash(&self, data: &[u8]) -> H256 {
        self(data)
    }
}

/// Keccak-256, the hash used by Ethereum-compatible engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256;

impl Hasher for Keccak256 {
    fn hash(&self, data: &[u8]) -> H256 {
        keccak256(data)
    }
}

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256Core::new();
    hasher.update(data);
    let result = hasher.finalize();
    H256::from_bytes(result.into())
}
