//! # chainabi-crypto
//!
//! Hash collaborators for the ChainABI codec.
//!
//! The codec only needs a hash to derive function selectors and event topics,
//! so it depends on the [`Hasher`] trait rather than on a concrete algorithm.
//! [`Keccak256`] is the default; any `Fn(&[u8]) -> H256` closure can be
//! injected instead (for example an SM3 implementation).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{keccak256, Hasher, Keccak256};
