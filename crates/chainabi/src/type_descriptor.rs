//! Type string parsing
//!
//! A type string is `<base><dims>*`, where each dimension group is either
//! `[N]` (fixed length `N`) or `[]` (dynamic). The rightmost group is the
//! outermost dimension: `uint256[3][]` is a dynamic list of `uint256[3]`.

use std::fmt;
use std::str::FromStr;

use crate::{AbiError, AbiResult};

/// Base (element) type of a parameter, with dimensions stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// Unsigned integer with bit size (8, 16, ..., 256)
    Uint(usize),
    /// Signed integer with bit size
    Int(usize),
    /// Boolean
    Bool,
    /// 20-byte address
    Address,
    /// Fixed-size bytes (size 1-32)
    FixedBytes(usize),
    /// Dynamic bytes
    Bytes,
    /// UTF-8 string
    String,
    /// Tuple (struct); components come from the ABI description
    Tuple,
}

impl BaseType {
    /// Parse a base type name such as `uint256`, `bytes32` or `tuple`.
    pub fn parse(s: &str) -> AbiResult<Self> {
        match s {
            "address" => return Ok(BaseType::Address),
            "bool" => return Ok(BaseType::Bool),
            "string" => return Ok(BaseType::String),
            "bytes" => return Ok(BaseType::Bytes),
            "tuple" => return Ok(BaseType::Tuple),
            _ => {}
        }

        if let Some(rest) = s.strip_prefix("uint") {
            return Ok(BaseType::Uint(parse_bits(s, rest)?));
        }
        if let Some(rest) = s.strip_prefix("int") {
            return Ok(BaseType::Int(parse_bits(s, rest)?));
        }
        if let Some(rest) = s.strip_prefix("bytes") {
            let size: usize = rest
                .parse()
                .map_err(|_| AbiError::MalformedType(format!("invalid bytes size: {}", s)))?;
            if !(1..=32).contains(&size) || rest.starts_with('0') {
                return Err(AbiError::MalformedType(format!("invalid bytes size: {}", s)));
            }
            return Ok(BaseType::FixedBytes(size));
        }

        Err(AbiError::MalformedType(format!("unknown type: {}", s)))
    }

    /// Whether values of this base type are encoded out of line
    pub fn is_dynamic(&self) -> bool {
        matches!(self, BaseType::Bytes | BaseType::String)
    }
}

fn parse_bits(full: &str, rest: &str) -> AbiResult<usize> {
    if rest.is_empty() {
        return Ok(256);
    }
    let bits: usize = rest
        .parse()
        .map_err(|_| AbiError::MalformedType(format!("invalid integer size: {}", full)))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 || rest.starts_with('0') {
        return Err(AbiError::MalformedType(format!("invalid integer size: {}", full)));
    }
    Ok(bits)
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Uint(bits) => write!(f, "uint{}", bits),
            BaseType::Int(bits) => write!(f, "int{}", bits),
            BaseType::Bool => f.write_str("bool"),
            BaseType::Address => f.write_str("address"),
            BaseType::FixedBytes(size) => write!(f, "bytes{}", size),
            BaseType::Bytes => f.write_str("bytes"),
            BaseType::String => f.write_str("string"),
            BaseType::Tuple => f.write_str("tuple"),
        }
    }
}

/// Upper bound on the values one parameter can hold through fixed
/// dimensions; static lists are materialized when a template is built.
pub const MAX_STATIC_ELEMENTS: usize = 1 << 20;

/// Parsed type string: base type plus list dimensions.
///
/// `dimensions` is in declaration order, so the outermost dimension is last.
/// A dimension of `0` is dynamic. Descriptors are immutable; reducing a
/// dimension returns a new descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    raw_type: String,
    base: BaseType,
    dimensions: Vec<usize>,
}

impl TypeDescriptor {
    /// Parse a type string such as `"uint256[3][]"`.
    pub fn parse(s: &str) -> AbiResult<Self> {
        let s = s.trim();
        let mut rest = s;
        let mut dimensions = Vec::new();

        while let Some(stripped) = rest.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| AbiError::MalformedType(format!("unbalanced brackets: {}", s)))?;
            let inner = &stripped[open + 1..];
            let dimension = if inner.is_empty() {
                0
            } else {
                let size: usize = inner.parse().map_err(|_| {
                    AbiError::MalformedType(format!("invalid dimension '{}' in {}", inner, s))
                })?;
                if size == 0 || inner.starts_with('+') {
                    return Err(AbiError::MalformedType(format!(
                        "invalid dimension '{}' in {}",
                        inner, s
                    )));
                }
                size
            };
            dimensions.push(dimension);
            rest = &stripped[..open];
        }

        if rest.contains('[') || rest.contains(']') {
            return Err(AbiError::MalformedType(format!("unbalanced brackets: {}", s)));
        }

        let base = BaseType::parse(rest)?;
        dimensions.reverse();

        let descriptor = Self {
            raw_type: rest.to_string(),
            base,
            dimensions,
        };
        match descriptor.static_elements() {
            Some(count) if count <= MAX_STATIC_ELEMENTS => Ok(descriptor),
            _ => Err(AbiError::MalformedType(format!(
                "fixed dimensions of {} exceed {} elements",
                s, MAX_STATIC_ELEMENTS
            ))),
        }
    }

    /// Product of the fixed dimensions, `None` on overflow. Dynamic
    /// dimensions count once, as a list template holds one element template.
    pub fn static_elements(&self) -> Option<usize> {
        self.dimensions
            .iter()
            .filter(|d| **d != 0)
            .try_fold(1usize, |acc, d| acc.checked_mul(*d))
    }

    /// Base type name as written, e.g. `uint` or `tuple`
    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    /// Parsed base type
    pub fn base_type(&self) -> BaseType {
        self.base
    }

    /// Dimension sizes, outermost last; `0` is dynamic
    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    /// Whether this type has at least one dimension
    pub fn is_list(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Whether the outermost dimension is dynamic
    pub fn is_dynamic_list(&self) -> bool {
        self.dimensions.last() == Some(&0)
    }

    /// Whether the outermost dimension is fixed
    pub fn is_fixed_list(&self) -> bool {
        matches!(self.dimensions.last(), Some(d) if *d != 0)
    }

    /// Outermost dimension, if this is a list
    pub fn last_dimension(&self) -> Option<usize> {
        self.dimensions.last().copied()
    }

    /// Descriptor of one element: the same type with the outermost dimension
    /// stripped. `None` if this is not a list.
    pub fn reduce_dimension_and_get_type(&self) -> Option<TypeDescriptor> {
        if !self.is_list() {
            return None;
        }
        let mut element = self.clone();
        element.dimensions.pop();
        Some(element)
    }

    /// Dimension suffix as written, e.g. `[3][]`
    pub fn dimensions_suffix(&self) -> String {
        self.dimensions
            .iter()
            .map(|d| if *d == 0 { "[]".to_string() } else { format!("[{}]", d) })
            .collect()
    }
}

impl fmt::Display for TypeDescriptor {
    /// Canonical form: `uint` is rendered as `uint256`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.dimensions_suffix())
    }
}

impl FromStr for TypeDescriptor {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
