//! # chainabi-primitives
//!
//! Primitive types shared by the ChainABI codec crates.
//!
//! - [`Address`]: 20-byte account address
//! - [`H256`]: 32-byte hash, used for event topics
//! - [`Selector`]: 4-byte function identifier
//! - [`I256`]: signed 256-bit integer for `intN` values
//! - [`U256`]: re-exported from `primitive-types` for `uintN` values

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
mod int;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, Selector, H256};
pub use int::{parse_uint, uint_fits_bits, IntError, I256};

// Re-export primitive-types for U256
pub use primitive_types::U256;
