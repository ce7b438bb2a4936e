//! Codec error types

use thiserror::Error;

/// ABI codec error.
///
/// Every error is fatal for the call that produced it: encode and decode
/// either fully succeed or return one of these.
#[derive(Debug, Error)]
pub enum AbiError {
    /// Unparseable type string (bad brackets, unknown base type, bad dimension)
    #[error("malformed type: {0}")]
    MalformedType(String),

    /// JSON contract interface is missing fields or is inconsistent
    #[error("invalid ABI description: {0}")]
    InvalidAbiDescription(String),

    /// Parameter or field count does not match the template
    #[error("arity mismatch: expected {expected}, got {got}")]
    ArityMismatch {
        /// Count required by the template
        expected: usize,
        /// Count supplied by the caller
        got: usize,
    },

    /// Integer does not fit the declared bit width
    #[error("numeric overflow: {value} does not fit {ty}")]
    NumericOverflow {
        /// Offending value as text
        value: String,
        /// Declared type, e.g. `uint8`
        ty: String,
    },

    /// Buffer too short for an in-place or offset-addressed field
    #[error("truncated input: need {needed} bytes, have {available}")]
    TruncatedInput {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Dynamic-field offset points outside the buffer or into the head
    #[error("invalid offset: {0}")]
    InvalidOffset(String),

    /// Byte-valued text cannot be read under any recognised format
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Text or value is not valid for the leaf type
    #[error("invalid value for {ty}: {reason}")]
    InvalidValue {
        /// Declared type
        ty: String,
        /// What was wrong
        reason: String,
    },

    /// A leaf was left unset when encoding
    #[error("missing value for {0}")]
    MissingValue(String),

    /// Value kind or element shape does not match the template
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Supplied type
        got: String,
    },

    /// Unknown function, event or selector
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for codec operations
pub type AbiResult<T> = Result<T, AbiError>;

impl From<hex::FromHexError> for AbiError {
    fn from(e: hex::FromHexError) -> Self {
        AbiError::UnsupportedEncoding(format!("invalid hex: {}", e))
    }
}

impl From<chainabi_primitives::PrimitiveError> for AbiError {
    fn from(e: chainabi_primitives::PrimitiveError) -> Self {
        AbiError::InvalidValue {
            ty: "primitive".to_string(),
            reason: e.to_string(),
        }
    }
}
