//! Value tree
//!
//! An [`AbiObject`] is a scalar leaf, a fixed-arity struct, or a list of
//! identically shaped elements. Templates built from a definition have the
//! right shape and unset leaves; encoding needs every leaf set, decoding
//! returns a filled copy of the template.

use std::fmt;

use chainabi_primitives::{uint_fits_bits, Address, I256, U256};

use crate::type_descriptor::BaseType;
use crate::{AbiError, AbiResult};

/// Size of an ABI word in bytes
pub const WORD_SIZE: usize = 32;

/// Type of a scalar leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Unsigned integer with bit size
    Uint(usize),
    /// Signed integer with bit size
    Int(usize),
    /// Boolean
    Bool,
    /// 20-byte address
    Address,
    /// Fixed-size bytes (1-32)
    FixedBytes(usize),
    /// Dynamic bytes
    Bytes,
    /// UTF-8 string
    String,
}

impl ValueType {
    /// Leaf type for a base type; `None` for tuples
    pub fn from_base(base: BaseType) -> Option<Self> {
        Some(match base {
            BaseType::Uint(bits) => ValueType::Uint(bits),
            BaseType::Int(bits) => ValueType::Int(bits),
            BaseType::Bool => ValueType::Bool,
            BaseType::Address => ValueType::Address,
            BaseType::FixedBytes(size) => ValueType::FixedBytes(size),
            BaseType::Bytes => ValueType::Bytes,
            BaseType::String => ValueType::String,
            BaseType::Tuple => return None,
        })
    }

    /// Whether the leaf is length-prefixed and encoded out of line
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ValueType::Bytes | ValueType::String)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Uint(bits) => write!(f, "uint{}", bits),
            ValueType::Int(bits) => write!(f, "int{}", bits),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Address => f.write_str("address"),
            ValueType::FixedBytes(size) => write!(f, "bytes{}", size),
            ValueType::Bytes => f.write_str("bytes"),
            ValueType::String => f.write_str("string"),
        }
    }
}

/// A scalar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned integer
    Uint(U256),
    /// Signed integer
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Address
    Address(Address),
    /// Fixed-size bytes; length must match the leaf type
    FixedBytes(Vec<u8>),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Address(_) => "address",
            Value::FixedBytes(_) => "fixed bytes",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
        }
    }
}

/// Check that `value` is representable as `ty`
pub(crate) fn validate(ty: ValueType, value: &Value) -> AbiResult<()> {
    match (ty, value) {
        (ValueType::Uint(bits), Value::Uint(v)) => {
            if !uint_fits_bits(v, bits) {
                return Err(AbiError::NumericOverflow {
                    value: v.to_string(),
                    ty: ty.to_string(),
                });
            }
        }
        (ValueType::Int(bits), Value::Int(v)) => {
            if !v.fits_bits(bits) {
                return Err(AbiError::NumericOverflow {
                    value: v.to_string(),
                    ty: ty.to_string(),
                });
            }
        }
        (ValueType::FixedBytes(size), Value::FixedBytes(bytes)) => {
            if bytes.len() != size {
                return Err(AbiError::InvalidValue {
                    ty: ty.to_string(),
                    reason: format!("expected {} bytes, got {}", size, bytes.len()),
                });
            }
        }
        (ValueType::Bool, Value::Bool(_))
        | (ValueType::Address, Value::Address(_))
        | (ValueType::Bytes, Value::Bytes(_))
        | (ValueType::String, Value::String(_)) => {}
        (ty, value) => {
            return Err(AbiError::TypeMismatch {
                expected: ty.to_string(),
                got: value.kind().to_string(),
            })
        }
    }
    Ok(())
}

/// A scalar leaf: its declared type and, once populated, its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    ty: ValueType,
    value: Option<Value>,
}

impl Leaf {
    /// Unset leaf of the given type
    pub fn new(ty: ValueType) -> Self {
        Self { ty, value: None }
    }

    /// Leaf populated with a validated value
    pub fn with_value(ty: ValueType, value: Value) -> AbiResult<Self> {
        let mut leaf = Self::new(ty);
        leaf.set(value)?;
        Ok(leaf)
    }

    /// Declared type
    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Current value, if set
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether a value has been set
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Set the value, checking kind, bit width and byte length
    pub fn set(&mut self, value: Value) -> AbiResult<()> {
        validate(self.ty, &value)?;
        self.value = Some(value);
        Ok(())
    }
}

/// A named struct field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name (may be empty)
    pub name: String,
    /// Field value
    pub value: AbiObject,
}

/// A fixed-arity struct (tuple) node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructObject {
    name: String,
    fields: Vec<Field>,
}

impl StructObject {
    /// Create a struct node
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Struct name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the struct has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field value by position
    pub fn get(&self, index: usize) -> Option<&AbiObject> {
        self.fields.get(index).map(|f| &f.value)
    }

    /// Mutable field value by position
    pub fn get_mut(&mut self, index: usize) -> Option<&mut AbiObject> {
        self.fields.get_mut(index).map(|f| &mut f.value)
    }

    /// Field value by name
    pub fn field(&self, name: &str) -> Option<&AbiObject> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Mutable field value by name
    pub fn field_mut(&mut self, name: &str) -> Option<&mut AbiObject> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .map(|f| &mut f.value)
    }

    /// Field values in order
    pub fn values(&self) -> impl Iterator<Item = &AbiObject> + Clone {
        self.fields.iter().map(|f| &f.value)
    }
}

/// Whether a list's length is fixed by the schema or carried in the encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListType {
    /// Fixed length
    Static(usize),
    /// Length-prefixed
    Dynamic,
}

/// A list node: uniformly shaped elements plus the element template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObject {
    list_type: ListType,
    element: Box<AbiObject>,
    items: Vec<AbiObject>,
}

impl ListObject {
    /// Template list: static lists get `n` copies of the element template,
    /// dynamic lists start empty.
    pub fn new(list_type: ListType, element: AbiObject) -> Self {
        let items = match list_type {
            ListType::Static(len) => vec![element.clone(); len],
            ListType::Dynamic => Vec::new(),
        };
        Self {
            list_type,
            element: Box::new(element),
            items,
        }
    }

    /// Static or dynamic
    pub fn list_type(&self) -> ListType {
        self.list_type
    }

    /// Element template
    pub fn element(&self) -> &AbiObject {
        &self.element
    }

    /// Elements
    pub fn items(&self) -> &[AbiObject] {
        &self.items
    }

    /// Mutable elements (shape is checked again when encoding)
    pub fn items_mut(&mut self) -> &mut [AbiObject] {
        &mut self.items
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fresh copy of the element template
    pub fn new_element(&self) -> AbiObject {
        (*self.element).clone()
    }

    /// Append an element to a dynamic list
    pub fn push(&mut self, item: AbiObject) -> AbiResult<()> {
        if let ListType::Static(len) = self.list_type {
            return Err(AbiError::ArityMismatch {
                expected: len,
                got: self.items.len() + 1,
            });
        }
        self.check_shape(&item)?;
        self.items.push(item);
        Ok(())
    }

    /// Replace all elements; static lists need exactly their declared length
    pub fn set_items(&mut self, items: Vec<AbiObject>) -> AbiResult<()> {
        if let ListType::Static(len) = self.list_type {
            if items.len() != len {
                return Err(AbiError::ArityMismatch {
                    expected: len,
                    got: items.len(),
                });
            }
        }
        for item in &items {
            self.check_shape(item)?;
        }
        self.items = items;
        Ok(())
    }

    pub(crate) fn check_shape(&self, item: &AbiObject) -> AbiResult<()> {
        if !self.element.same_shape(item) {
            return Err(AbiError::TypeMismatch {
                expected: self.element.type_string(),
                got: item.type_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn from_parts(list_type: ListType, element: AbiObject, items: Vec<AbiObject>) -> Self {
        Self {
            list_type,
            element: Box::new(element),
            items,
        }
    }
}

/// A node of the value tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiObject {
    /// Scalar leaf
    Value(Leaf),
    /// Struct (tuple)
    Struct(StructObject),
    /// Static or dynamic list
    List(ListObject),
}

impl AbiObject {
    /// Unset leaf of the given type
    pub fn leaf(ty: ValueType) -> Self {
        AbiObject::Value(Leaf::new(ty))
    }

    /// Whether the node is encoded out of line.
    ///
    /// Strings and bytes, dynamic lists, and any struct or static list
    /// containing a dynamic member are dynamic.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiObject::Value(leaf) => leaf.ty.is_dynamic(),
            AbiObject::Struct(s) => s.fields.iter().any(|f| f.value.is_dynamic()),
            AbiObject::List(list) => match list.list_type {
                ListType::Dynamic => true,
                ListType::Static(_) => list.element.is_dynamic(),
            },
        }
    }

    /// Bytes the node occupies in its parent's head: one word for dynamic
    /// nodes, the full in-place encoding for static ones. Saturates at
    /// `usize::MAX`, which no buffer can satisfy.
    pub fn head_len(&self) -> usize {
        if self.is_dynamic() {
            return WORD_SIZE;
        }
        match self {
            AbiObject::Value(_) => WORD_SIZE,
            AbiObject::Struct(s) => s
                .fields
                .iter()
                .map(|f| f.value.head_len())
                .fold(0, usize::saturating_add),
            AbiObject::List(list) => match list.list_type {
                ListType::Static(len) => len
                    .checked_mul(list.element.head_len())
                    .unwrap_or(usize::MAX),
                ListType::Dynamic => WORD_SIZE,
            },
        }
    }

    /// Whether every leaf has a value
    pub fn is_populated(&self) -> bool {
        match self {
            AbiObject::Value(leaf) => leaf.is_set(),
            AbiObject::Struct(s) => s.fields.iter().all(|f| f.value.is_populated()),
            AbiObject::List(list) => list.items.iter().all(AbiObject::is_populated),
        }
    }

    /// Structural equality ignoring leaf values and dynamic list lengths
    pub fn same_shape(&self, other: &AbiObject) -> bool {
        match (self, other) {
            (AbiObject::Value(a), AbiObject::Value(b)) => a.ty == b.ty,
            (AbiObject::Struct(a), AbiObject::Struct(b)) => {
                a.fields.len() == b.fields.len()
                    && a.fields
                        .iter()
                        .zip(&b.fields)
                        .all(|(x, y)| x.value.same_shape(&y.value))
            }
            (AbiObject::List(a), AbiObject::List(b)) => {
                a.list_type == b.list_type && a.element.same_shape(&b.element)
            }
            _ => false,
        }
    }

    /// Canonical type of the node, e.g. `(string,uint256)[]`
    pub fn type_string(&self) -> String {
        match self {
            AbiObject::Value(leaf) => leaf.ty.to_string(),
            AbiObject::Struct(s) => {
                let inner: Vec<String> = s.fields.iter().map(|f| f.value.type_string()).collect();
                format!("({})", inner.join(","))
            }
            AbiObject::List(list) => match list.list_type {
                ListType::Static(len) => format!("{}[{}]", list.element.type_string(), len),
                ListType::Dynamic => format!("{}[]", list.element.type_string()),
            },
        }
    }

    /// Set the value of a leaf node
    pub fn set_value(&mut self, value: Value) -> AbiResult<()> {
        match self {
            AbiObject::Value(leaf) => leaf.set(value),
            other => Err(AbiError::TypeMismatch {
                expected: other.type_string(),
                got: value.kind().to_string(),
            }),
        }
    }

    /// Leaf value, if this is a populated leaf
    pub fn value(&self) -> Option<&Value> {
        match self {
            AbiObject::Value(leaf) => leaf.value(),
            _ => None,
        }
    }

    /// Borrow as struct
    pub fn as_struct(&self) -> Option<&StructObject> {
        match self {
            AbiObject::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Mutably borrow as struct
    pub fn as_struct_mut(&mut self) -> Option<&mut StructObject> {
        match self {
            AbiObject::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as list
    pub fn as_list(&self) -> Option<&ListObject> {
        match self {
            AbiObject::List(list) => Some(list),
            _ => None,
        }
    }

    /// Mutably borrow as list
    pub fn as_list_mut(&mut self) -> Option<&mut ListObject> {
        match self {
            AbiObject::List(list) => Some(list),
            _ => None,
        }
    }
}
