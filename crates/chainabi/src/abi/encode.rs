//! ABI encoding
//!
//! Head/tail layout: every struct, static list and argument list is a
//! sequence whose head holds static children in place and a 32-byte offset
//! for each dynamic child. Offsets are relative to the start of the sequence;
//! dynamic children's encodings are appended to the tail in order. Dynamic
//! lists prefix the sequence with their element count.

use chainabi_primitives::U256;

use crate::abi::object::{validate, AbiObject, Leaf, ListType, Value, WORD_SIZE};
use crate::{AbiError, AbiResult};

/// Encode a fully populated value tree.
///
/// A top-level struct is encoded as an argument list (no outer offset), which
/// is what function calls and return data use.
pub fn encode(object: &AbiObject) -> AbiResult<Vec<u8>> {
    let mut out = Vec::with_capacity(object.head_len());
    encode_into(object, &mut out)?;
    tracing::trace!(bytes = out.len(), ty = %object.type_string(), "encoded value tree");
    Ok(out)
}

fn encode_into(object: &AbiObject, out: &mut Vec<u8>) -> AbiResult<()> {
    match object {
        AbiObject::Value(leaf) => encode_leaf(leaf, out),
        AbiObject::Struct(s) => encode_sequence(s.values(), out),
        AbiObject::List(list) => {
            for item in list.items() {
                list.check_shape(item)?;
            }
            match list.list_type() {
                ListType::Static(len) => {
                    if list.len() != len {
                        return Err(AbiError::ArityMismatch {
                            expected: len,
                            got: list.len(),
                        });
                    }
                }
                ListType::Dynamic => out.extend_from_slice(&usize_word(list.len())),
            }
            encode_sequence(list.items().iter(), out)
        }
    }
}

fn encode_sequence<'a, I>(children: I, out: &mut Vec<u8>) -> AbiResult<()>
where
    I: Iterator<Item = &'a AbiObject> + Clone,
{
    let head_size: usize = children.clone().map(AbiObject::head_len).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for child in children {
        if child.is_dynamic() {
            head.extend_from_slice(&usize_word(head_size + tail.len()));
            encode_into(child, &mut tail)?;
        } else {
            encode_into(child, &mut head)?;
        }
    }

    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(())
}

fn encode_leaf(leaf: &Leaf, out: &mut Vec<u8>) -> AbiResult<()> {
    let ty = leaf.value_type();
    let value = leaf
        .value()
        .ok_or_else(|| AbiError::MissingValue(ty.to_string()))?;
    validate(ty, value)?;

    match value {
        Value::Uint(v) => out.extend_from_slice(&u256_word(v)),
        Value::Int(v) => {
            let word = v.to_be_bytes().map_err(|_| AbiError::NumericOverflow {
                value: v.to_string(),
                ty: ty.to_string(),
            })?;
            out.extend_from_slice(&word);
        }
        Value::Bool(b) => out.extend_from_slice(&usize_word(usize::from(*b))),
        Value::Address(addr) => {
            let mut word = [0u8; WORD_SIZE];
            word[12..].copy_from_slice(addr.as_bytes());
            out.extend_from_slice(&word);
        }
        Value::FixedBytes(bytes) => {
            let mut word = [0u8; WORD_SIZE];
            word[..bytes.len()].copy_from_slice(bytes);
            out.extend_from_slice(&word);
        }
        Value::Bytes(bytes) => encode_bytes(bytes, out),
        Value::String(s) => encode_bytes(s.as_bytes(), out),
    }
    Ok(())
}

/// Length word followed by the data right-padded to a word boundary
fn encode_bytes(data: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(data.len()));
    out.extend_from_slice(data);
    let padding = data.len().div_ceil(WORD_SIZE) * WORD_SIZE - data.len();
    out.resize(out.len() + padding, 0);
}

/// Big-endian 32-byte word
pub(crate) fn u256_word(value: &U256) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

pub(crate) fn usize_word(value: usize) -> [u8; WORD_SIZE] {
    u256_word(&U256::from(value))
}
