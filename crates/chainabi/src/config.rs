//! Codec configuration

use serde::{Deserialize, Serialize};

/// Default upper bound for decoded dynamic lengths (1 Mi elements / bytes)
pub const DEFAULT_MAX_DYNAMIC_LEN: usize = 1 << 20;

/// Text rendering used for byte-valued leaves in pretty strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BytesFormat {
    /// `0x`-prefixed lower-case hex
    Hex,
    /// Standard base64 without prefix
    Base64,
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodecConfig {
    /// Largest element count or byte length accepted for a dynamic field
    /// while decoding (default: 1 Mi)
    pub max_dynamic_len: usize,
    /// Rendering of `bytes1`..`bytes32` (default: hex)
    pub fixed_bytes_format: BytesFormat,
    /// Rendering of `bytes` (default: base64)
    pub dynamic_bytes_format: BytesFormat,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_dynamic_len: DEFAULT_MAX_DYNAMIC_LEN,
            fixed_bytes_format: BytesFormat::Hex,
            dynamic_bytes_format: BytesFormat::Base64,
        }
    }
}

impl CodecConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decode limit for dynamic lengths
    pub fn with_max_dynamic_len(mut self, max_dynamic_len: usize) -> Self {
        self.max_dynamic_len = max_dynamic_len;
        self
    }

    /// Set the rendering of fixed-size byte leaves
    pub fn with_fixed_bytes_format(mut self, format: BytesFormat) -> Self {
        self.fixed_bytes_format = format;
        self
    }

    /// Set the rendering of dynamic byte leaves
    pub fn with_dynamic_bytes_format(mut self, format: BytesFormat) -> Self {
        self.dynamic_bytes_format = format;
        self
    }
}
