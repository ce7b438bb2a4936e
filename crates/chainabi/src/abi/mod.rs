//! Value trees and the head/tail codec
//!
//! This module provides:
//! - Templates built from parameter definitions
//! - Encoding of populated trees
//! - Template-driven decoding into filled copies
//!
//! # Example
//!
//! ```rust
//! use chainabi::abi::{create_input_object, decode, encode, Value};
//! use chainabi::{ContractAbi, U256};
//!
//! let abi = ContractAbi::from_json(
//!     r#"[{"type":"function","name":"set","inputs":[{"name":"x","type":"uint256"}]}]"#,
//! ).unwrap();
//! let function = abi.function("set").unwrap();
//!
//! let template = create_input_object(function);
//! let mut call = template.clone();
//! call.as_struct_mut().unwrap().get_mut(0).unwrap()
//!     .set_value(Value::Uint(U256::from(42))).unwrap();
//!
//! let data = encode(&call).unwrap();
//! let decoded = decode(&template, &data).unwrap();
//! assert_eq!(decoded, call);
//! ```

mod decode;
mod encode;
mod object;
mod template;

pub use decode::{decode, Decoder};
pub use encode::encode;
pub use object::{
    AbiObject, Field, Leaf, ListObject, ListType, StructObject, Value, ValueType, WORD_SIZE,
};
pub use template::{create_event_data_object, create_input_object, create_object, create_output_object};
