//! Integer helpers for `intN` / `uintN` values

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use thiserror::Error;

/// Integer parsing and range error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntError {
    /// Not a decimal or 0x-hex integer literal
    #[error("invalid integer literal: {0}")]
    InvalidLiteral(String),
    /// Magnitude does not fit in 256 bits
    #[error("integer out of 256-bit range: {0}")]
    Overflow(String),
}

/// Signed 256-bit integer, stored as sign and magnitude.
///
/// Zero is never negative. Values built through [`I256::new`] may hold a
/// magnitude outside the signed 256-bit range; [`I256::fits_bits`] checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256 {
    /// Absolute value
    pub abs: U256,
    /// Sign (true if negative)
    pub negative: bool,
}

impl I256 {
    /// Zero
    pub const ZERO: I256 = I256 {
        abs: U256([0; 4]),
        negative: false,
    };

    /// Create a new I256
    pub fn new(abs: U256, negative: bool) -> Self {
        Self {
            abs,
            negative: negative && !abs.is_zero(),
        }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        Self::new(U256::from(value.unsigned_abs()), value < 0)
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Check if negative
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether the value is representable as a two's complement `intN`,
    /// i.e. lies in `-2^(N-1) ..= 2^(N-1) - 1`.
    pub fn fits_bits(&self, bits: usize) -> bool {
        if bits == 0 || bits > 256 {
            return false;
        }
        let limit = U256::one() << (bits - 1);
        if self.negative {
            self.abs <= limit
        } else {
            self.abs < limit
        }
    }

    /// Two's complement big-endian encoding in 32 bytes.
    pub fn to_be_bytes(&self) -> Result<[u8; 32], IntError> {
        if !self.fits_bits(256) {
            return Err(IntError::Overflow(self.to_string()));
        }
        let word = if self.negative {
            (!self.abs).overflowing_add(U256::one()).0
        } else {
            self.abs
        };
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        Ok(bytes)
    }

    /// Interpret 32 bytes as a two's complement big-endian value.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let word = U256::from_big_endian(bytes);
        if bytes[0] & 0x80 != 0 {
            Self::new((!word).overflowing_add(U256::one()).0, true)
        } else {
            Self::new(word, false)
        }
    }

    /// Parse a decimal or `0x` hex literal with an optional leading `-`.
    pub fn parse(s: &str) -> Result<Self, IntError> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let abs = parse_uint(digits)?;
        Ok(Self::new(abs, negative))
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.abs)
        } else {
            write!(f, "{}", self.abs)
        }
    }
}

impl FromStr for I256 {
    type Err = IntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_i128(value as i128)
    }
}

/// Parse an unsigned decimal or `0x` hex literal into a U256.
///
/// Literals whose magnitude exceeds `2^256 - 1` fail with [`IntError::Overflow`].
pub fn parse_uint(s: &str) -> Result<U256, IntError> {
    let s = s.trim();
    if let Some(hex_digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IntError::InvalidLiteral(s.to_string()));
        }
        let significant = hex_digits.trim_start_matches('0');
        if significant.len() > 64 {
            return Err(IntError::Overflow(s.to_string()));
        }
        let padded = format!("{:0>64}", significant);
        let bytes = hex::decode(padded).map_err(|_| IntError::InvalidLiteral(s.to_string()))?;
        return Ok(U256::from_big_endian(&bytes));
    }

    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(IntError::InvalidLiteral(s.to_string()));
    }
    // Every character is a digit, so the only possible failure is overflow.
    U256::from_dec_str(s).map_err(|_| IntError::Overflow(s.to_string()))
}

/// Whether an unsigned value is representable in `bits` bits.
pub fn uint_fits_bits(value: &U256, bits: usize) -> bool {
    bits > 0 && bits <= 256 && value.bits() <= bits
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Parsing ====================

    #[test]
    fn test_parse_uint_decimal_and_hex() {
        assert_eq!(parse_uint("100").unwrap(), U256::from(100));
        assert_eq!(parse_uint("0x64").unwrap(), U256::from(100));
        assert_eq!(parse_uint("0x0000064").unwrap(), U256::from(100));
    }

    #[test]
    fn test_parse_uint_max() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(parse_uint(max).unwrap(), U256::MAX);
        assert_eq!(parse_uint(&format!("0x{}", "f".repeat(64))).unwrap(), U256::MAX);
    }

    #[test]
    fn test_parse_uint_overflow() {
        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(matches!(parse_uint(over), Err(IntError::Overflow(_))));
        assert!(matches!(
            parse_uint(&format!("0x1{}", "0".repeat(64))),
            Err(IntError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_uint_invalid() {
        assert!(matches!(parse_uint(""), Err(IntError::InvalidLiteral(_))));
        assert!(matches!(parse_uint("12a"), Err(IntError::InvalidLiteral(_))));
        assert!(matches!(parse_uint("0x"), Err(IntError::InvalidLiteral(_))));
        assert!(matches!(parse_uint("-1"), Err(IntError::InvalidLiteral(_))));
    }

    #[test]
    fn test_i256_parse() {
        assert_eq!(I256::parse("-100").unwrap(), I256::from_i128(-100));
        assert_eq!(I256::parse("100").unwrap(), I256::from_i128(100));
        assert_eq!(I256::parse("-0x10").unwrap(), I256::from_i128(-16));
        assert_eq!(I256::parse("-0").unwrap(), I256::ZERO);
        assert!(!I256::parse("-0").unwrap().is_negative());
    }

    // ==================== Two's complement ====================

    #[test]
    fn test_i256_minus_one_is_all_ff() {
        let bytes = I256::from_i128(-1).to_be_bytes().unwrap();
        assert_eq!(bytes, [0xff; 32]);
        assert_eq!(I256::from_be_bytes(&bytes), I256::from_i128(-1));
    }

    #[test]
    fn test_i256_min_value() {
        let min = I256::new(U256::one() << 255, true);
        let bytes = min.to_be_bytes().unwrap();
        assert_eq!(bytes[0], 0x80);
        assert!(bytes[1..].iter().all(|b| *b == 0));
        assert_eq!(I256::from_be_bytes(&bytes), min);
    }

    #[test]
    fn test_i256_out_of_range() {
        let too_big = I256::new(U256::one() << 255, false);
        assert!(!too_big.fits_bits(256));
        assert!(matches!(too_big.to_be_bytes(), Err(IntError::Overflow(_))));
    }

    #[test]
    fn test_i256_fits_bits() {
        assert!(I256::from_i128(127).fits_bits(8));
        assert!(!I256::from_i128(128).fits_bits(8));
        assert!(I256::from_i128(-128).fits_bits(8));
        assert!(!I256::from_i128(-129).fits_bits(8));
        assert!(!I256::ZERO.fits_bits(0));
    }

    #[test]
    fn test_uint_fits_bits() {
        assert!(uint_fits_bits(&U256::from(255), 8));
        assert!(!uint_fits_bits(&U256::from(256), 8));
        assert!(uint_fits_bits(&U256::MAX, 256));
    }

    #[test]
    fn test_i256_display() {
        assert_eq!(I256::from_i128(-42).to_string(), "-42");
        assert_eq!(I256::from_i128(42).to_string(), "42");
    }
}
