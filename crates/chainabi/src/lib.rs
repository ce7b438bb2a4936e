//! # chainabi
//!
//! Contract ABI codec for ChainABI client libraries.
//!
//! ## Features
//!
//! - **TypeDescriptor**: parsing of ABI type strings and their list dimensions
//! - **ContractAbi**: JSON contract interfaces, signatures and selectors
//! - **AbiObject**: value trees built from parameter definitions
//! - **encode / decode**: head/tail binary encoding driven by a template
//! - **JsonWrapper**: string and JSON parameters in, pretty strings out
//! - **AbiCodec**: method, constructor and event level operations
//!
//! ## Quick Start
//!
//! ```rust
//! use chainabi::{AbiCodec, ContractAbi};
//!
//! let abi = ContractAbi::from_json(
//!     r#"[{"type":"function","name":"transfer","inputs":[
//!         {"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
//!         "outputs":[{"name":"","type":"bool"}]}]"#,
//! ).unwrap();
//!
//! let codec = AbiCodec::new();
//! let data = codec
//!     .encode_method(&abi, "transfer", &["0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d", "1000"])
//!     .unwrap();
//! assert_eq!(hex::encode(&data[..4]), "a9059cbb");
//!
//! let params = codec.decode_method_input(&abi, "transfer", &data).unwrap();
//! assert_eq!(params[1], "1000");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
mod codec;
pub mod config;
pub mod contract;
mod error;
mod signature;
pub mod type_descriptor;
pub mod wrapper;

pub use codec::AbiCodec;
pub use config::{BytesFormat, CodecConfig};
pub use contract::{
    ContractAbi, EventDefinition, FunctionDefinition, FunctionKind, Param, StateMutability,
};
pub use error::{AbiError, AbiResult};
pub use type_descriptor::{BaseType, TypeDescriptor};
pub use wrapper::JsonWrapper;

// Re-export primitives for convenience
pub use chainabi_crypto::{keccak256, Hasher, Keccak256};
pub use chainabi_primitives::{Address, Selector, H256, I256, U256};
