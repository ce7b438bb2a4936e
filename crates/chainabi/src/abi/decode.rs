//! ABI decoding
//!
//! Walks a template in the same head/tail order as the encoder. Static
//! children are read in place at the head cursor; dynamic children are read
//! at `sequence start + offset`, so tails are followed by offset rather than
//! by position. The template is never modified: the result is a filled copy.
//!
//! Every decoded leaf and dynamic list charges the words it occupies against
//! the input length. Offsets that alias the same tail make the output outgrow
//! the input; that is rejected as `InvalidOffset`.

use chainabi_primitives::{uint_fits_bits, Address, I256, U256};

use crate::abi::object::{AbiObject, Field, ListObject, ListType, Leaf, StructObject, Value, ValueType, WORD_SIZE};
use crate::config::CodecConfig;
use crate::{AbiError, AbiResult};

/// Decode `data` against a template using the default configuration
pub fn decode(template: &AbiObject, data: &[u8]) -> AbiResult<AbiObject> {
    Decoder::new(&CodecConfig::default()).decode(template, data)
}

/// Template-driven decoder
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    config: &'a CodecConfig,
}

impl<'a> Decoder<'a> {
    /// Create a decoder
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config }
    }

    /// Decode `data` into a populated copy of `template`.
    ///
    /// A top-level struct is read as an argument list starting at offset 0.
    pub fn decode(&self, template: &AbiObject, data: &[u8]) -> AbiResult<AbiObject> {
        tracing::trace!(bytes = data.len(), ty = %template.type_string(), "decoding value tree");
        let mut budget = Budget::new(data);
        self.decode_at(template, data, 0, &mut budget)
    }

    fn decode_at(
        &self,
        template: &AbiObject,
        data: &[u8],
        offset: usize,
        budget: &mut Budget,
    ) -> AbiResult<AbiObject> {
        match template {
            AbiObject::Value(leaf) => Ok(AbiObject::Value(self.decode_leaf(leaf, data, offset, budget)?)),
            AbiObject::Struct(s) => {
                let values = self.decode_sequence(s.values(), data, offset, budget)?;
                let fields = s
                    .fields()
                    .iter()
                    .zip(values)
                    .map(|(field, value)| Field {
                        name: field.name.clone(),
                        value,
                    })
                    .collect();
                Ok(AbiObject::Struct(StructObject::new(s.name(), fields)))
            }
            AbiObject::List(list) => {
                let element = list.element();
                let items = match list.list_type() {
                    ListType::Static(len) => {
                        self.decode_sequence(std::iter::repeat(element).take(len), data, offset, budget)?
                    }
                    ListType::Dynamic => {
                        let count = self.read_len(data, offset)?;
                        let start = offset + WORD_SIZE;
                        // Each element needs at least its head slot
                        let needed = count
                            .checked_mul(element.head_len())
                            .and_then(|n| n.checked_add(start))
                            .unwrap_or(usize::MAX);
                        if needed > data.len() {
                            return Err(AbiError::TruncatedInput {
                                needed,
                                available: data.len(),
                            });
                        }
                        budget.charge(1, offset)?;
                        self.decode_sequence(std::iter::repeat(element).take(count), data, start, budget)?
                    }
                };
                Ok(AbiObject::List(ListObject::from_parts(
                    list.list_type(),
                    element.clone(),
                    items,
                )))
            }
        }
    }

    fn decode_sequence<'t, I>(
        &self,
        templates: I,
        data: &[u8],
        base: usize,
        budget: &mut Budget,
    ) -> AbiResult<Vec<AbiObject>>
    where
        I: Iterator<Item = &'t AbiObject> + Clone,
    {
        let head_size = templates
            .clone()
            .map(AbiObject::head_len)
            .fold(0usize, usize::saturating_add);
        let mut cursor = base;
        let mut values = Vec::new();

        for template in templates {
            if template.is_dynamic() {
                let relative = read_offset(data, cursor)?;
                if relative < head_size {
                    return Err(AbiError::InvalidOffset(format!(
                        "offset {} at byte {} points into a {}-byte head",
                        relative, cursor, head_size
                    )));
                }
                let target = base
                    .checked_add(relative)
                    .filter(|t| *t < data.len())
                    .ok_or_else(|| {
                        AbiError::InvalidOffset(format!(
                            "offset {} at byte {} is outside a {}-byte buffer",
                            relative,
                            cursor,
                            data.len()
                        ))
                    })?;
                values.push(self.decode_at(template, data, target, budget)?);
                cursor += WORD_SIZE;
            } else {
                values.push(self.decode_at(template, data, cursor, budget)?);
                cursor += template.head_len();
            }
        }

        Ok(values)
    }

    fn decode_leaf(&self, leaf: &Leaf, data: &[u8], offset: usize, budget: &mut Budget) -> AbiResult<Leaf> {
        let ty = leaf.value_type();
        if !ty.is_dynamic() {
            budget.charge(1, offset)?;
        }
        let value = match ty {
            ValueType::Uint(bits) => {
                let value = U256::from_big_endian(read_word(data, offset)?);
                if !uint_fits_bits(&value, bits) {
                    return Err(AbiError::NumericOverflow {
                        value: value.to_string(),
                        ty: ty.to_string(),
                    });
                }
                Value::Uint(value)
            }
            ValueType::Int(bits) => {
                let mut word = [0u8; WORD_SIZE];
                word.copy_from_slice(read_word(data, offset)?);
                let value = I256::from_be_bytes(&word);
                if !value.fits_bits(bits) {
                    return Err(AbiError::NumericOverflow {
                        value: value.to_string(),
                        ty: ty.to_string(),
                    });
                }
                Value::Int(value)
            }
            ValueType::Bool => {
                let word = read_word(data, offset)?;
                match U256::from_big_endian(word).low_u64() {
                    0 if word.iter().all(|b| *b == 0) => Value::Bool(false),
                    1 if word[..31].iter().all(|b| *b == 0) => Value::Bool(true),
                    _ => {
                        return Err(AbiError::InvalidValue {
                            ty: ty.to_string(),
                            reason: format!("0x{} is not 0 or 1", hex::encode(word)),
                        })
                    }
                }
            }
            ValueType::Address => {
                let word = read_word(data, offset)?;
                Value::Address(Address::from_slice(&word[12..]).map_err(|e| AbiError::InvalidValue {
                    ty: ty.to_string(),
                    reason: e.to_string(),
                })?)
            }
            ValueType::FixedBytes(size) => {
                let word = read_word(data, offset)?;
                Value::FixedBytes(word[..size].to_vec())
            }
            ValueType::Bytes => Value::Bytes(self.read_bytes(data, offset, budget)?.to_vec()),
            ValueType::String => {
                let bytes = self.read_bytes(data, offset, budget)?.to_vec();
                Value::String(String::from_utf8(bytes).map_err(|e| AbiError::InvalidValue {
                    ty: ty.to_string(),
                    reason: format!("invalid UTF-8: {}", e),
                })?)
            }
        };
        Leaf::with_value(ty, value)
    }

    /// Length-prefixed byte string at `offset`
    fn read_bytes<'d>(&self, data: &'d [u8], offset: usize, budget: &mut Budget) -> AbiResult<&'d [u8]> {
        let len = self.read_len(data, offset)?;
        let start = offset + WORD_SIZE;
        let end = start + len;
        check_length(data, end)?;
        budget.charge(1 + len.div_ceil(WORD_SIZE), offset)?;
        Ok(&data[start..end])
    }

    /// Element count or byte length word, bounded by the configured limit
    fn read_len(&self, data: &[u8], offset: usize) -> AbiResult<usize> {
        let word = read_word(data, offset)?;
        let len = U256::from_big_endian(word);
        if len > U256::from(self.config.max_dynamic_len) {
            return Err(AbiError::TruncatedInput {
                needed: usize::MAX,
                available: data.len(),
            });
        }
        Ok(len.as_usize())
    }
}

/// Words of input not yet claimed by a decoded value.
///
/// A well-formed encoding gives every leaf and every dynamic list count its
/// own words, so the output can never claim more words than the input holds.
struct Budget {
    remaining: usize,
}

impl Budget {
    fn new(data: &[u8]) -> Self {
        Self {
            remaining: data.len() / WORD_SIZE,
        }
    }

    fn charge(&mut self, words: usize, offset: usize) -> AbiResult<()> {
        self.remaining = self.remaining.checked_sub(words).ok_or_else(|| {
            AbiError::InvalidOffset(format!(
                "value at byte {} reuses input already decoded; offsets overlap",
                offset
            ))
        })?;
        Ok(())
    }
}

/// 32-byte word at `offset`
fn read_word(data: &[u8], offset: usize) -> AbiResult<&[u8]> {
    let end = offset.checked_add(WORD_SIZE).unwrap_or(usize::MAX);
    check_length(data, end)?;
    Ok(&data[offset..end])
}

/// Offset word at `offset`; values that cannot address any buffer are invalid
fn read_offset(data: &[u8], offset: usize) -> AbiResult<usize> {
    let word = read_word(data, offset)?;
    let value = U256::from_big_endian(word);
    if value > U256::from(data.len()) {
        return Err(AbiError::InvalidOffset(format!(
            "offset 0x{} at byte {} exceeds buffer length {}",
            hex::encode(word),
            offset,
            data.len()
        )));
    }
    Ok(value.as_usize())
}

/// Check that data has at least `required` bytes
fn check_length(data: &[u8], required: usize) -> AbiResult<()> {
    if data.len() < required {
        return Err(AbiError::TruncatedInput {
            needed: required,
            available: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode::encode;

    fn args(templates: Vec<AbiObject>) -> AbiObject {
        let fields = templates
            .into_iter()
            .map(|value| Field { name: String::new(), value })
            .collect();
        AbiObject::Struct(StructObject::new("", fields))
    }

    fn word(value: u64) -> Vec<u8> {
        let mut w = vec![0u8; 32];
        w[24..].copy_from_slice(&value.to_be_bytes());
        w
    }

    fn first_value(decoded: &AbiObject) -> &Value {
        decoded.as_struct().unwrap().get(0).unwrap().value().unwrap()
    }

    // ==================== Scalars ====================

    #[test]
    fn test_decode_address() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let mut encoded = [0u8; 32];
        encoded[12..32].copy_from_slice(addr.as_bytes());

        let decoded = decode(&args(vec![AbiObject::leaf(ValueType::Address)]), &encoded).unwrap();
        assert_eq!(first_value(&decoded), &Value::Address(addr));
    }

    #[test]
    fn test_decode_int_negative() {
        let decoded = decode(&args(vec![AbiObject::leaf(ValueType::Int(256))]), &[0xff; 32]).unwrap();
        assert_eq!(first_value(&decoded), &Value::Int(I256::from_i128(-1)));
    }

    #[test]
    fn test_decode_uint_out_of_declared_range() {
        let data = word(256);
        let result = decode(&args(vec![AbiObject::leaf(ValueType::Uint(8))]), &data);
        assert!(matches!(result, Err(AbiError::NumericOverflow { .. })));
    }

    #[test]
    fn test_decode_bool_rejects_other_values() {
        let result = decode(&args(vec![AbiObject::leaf(ValueType::Bool)]), &word(2));
        assert!(matches!(result, Err(AbiError::InvalidValue { .. })));
        let decoded = decode(&args(vec![AbiObject::leaf(ValueType::Bool)]), &word(1)).unwrap();
        assert_eq!(first_value(&decoded), &Value::Bool(true));
    }

    #[test]
    fn test_decode_string() {
        let mut encoded = vec![0u8; 96];
        encoded[31] = 32;
        encoded[63] = 5;
        encoded[64..69].copy_from_slice(b"hello");

        let decoded = decode(&args(vec![AbiObject::leaf(ValueType::String)]), &encoded).unwrap();
        assert_eq!(first_value(&decoded), &Value::String("hello".to_string()));
    }

    // ==================== Offsets ====================

    #[test]
    fn test_decoder_follows_offsets_not_tail_order() {
        // f(string,string) with the second tail placed before the first
        let mut data = Vec::new();
        data.extend(word(0x80)); // a -> second tail slot
        data.extend(word(0x40)); // b -> first tail slot
        data.extend(word(1));
        data.extend({
            let mut w = vec![0u8; 32];
            w[0] = b'b';
            w
        });
        data.extend(word(1));
        data.extend({
            let mut w = vec![0u8; 32];
            w[0] = b'a';
            w
        });

        let template = args(vec![AbiObject::leaf(ValueType::String), AbiObject::leaf(ValueType::String)]);
        let decoded = decode(&template, &data).unwrap();
        let s = decoded.as_struct().unwrap();
        assert_eq!(s.get(0).unwrap().value(), Some(&Value::String("a".into())));
        assert_eq!(s.get(1).unwrap().value(), Some(&Value::String("b".into())));
    }

    #[test]
    fn test_offset_outside_buffer() {
        let data = word(0x1000);
        let result = decode(&args(vec![AbiObject::leaf(ValueType::Bytes)]), &data);
        assert!(matches!(result, Err(AbiError::InvalidOffset(_))));
    }

    #[test]
    fn test_offset_into_head() {
        let mut data = word(0);
        data.extend(word(0));
        let result = decode(&args(vec![AbiObject::leaf(ValueType::String)]), &data);
        assert!(matches!(result, Err(AbiError::InvalidOffset(_))));
    }

    #[test]
    fn test_huge_offset_word() {
        let data = vec![0xff; 64];
        let result = decode(&args(vec![AbiObject::leaf(ValueType::String)]), &data);
        assert!(matches!(result, Err(AbiError::InvalidOffset(_))));
    }

    fn nested_uint_lists(depth: usize) -> AbiObject {
        (0..depth).fold(AbiObject::leaf(ValueType::Uint(256)), |element, _| {
            AbiObject::List(ListObject::new(ListType::Dynamic, element))
        })
    }

    #[test]
    fn test_nested_lists_with_distinct_tails() {
        let mut data = word(0x20);
        for _ in 0..2 {
            data.extend(word(1));
            data.extend(word(0x20));
        }
        data.extend(word(1));
        data.extend(word(7));

        let decoded = decode(&args(vec![nested_uint_lists(3)]), &data).unwrap();
        let outer = decoded.as_struct().unwrap().get(0).unwrap().as_list().unwrap();
        let middle = outer.items()[0].as_list().unwrap();
        let inner = middle.items()[0].as_list().unwrap();
        assert_eq!(inner.items()[0].value(), Some(&Value::Uint(7u64.into())));
    }

    #[test]
    fn test_aliased_offsets_are_rejected() {
        // Every element of the two outer levels points at the same child list
        let mut data = word(0x20);
        for _ in 0..2 {
            data.extend(word(3));
            data.extend(word(0x60).repeat(3));
        }
        data.extend(word(3));
        data.extend(word(1).repeat(3));

        let result = decode(&args(vec![nested_uint_lists(3)]), &data);
        assert!(matches!(result, Err(AbiError::InvalidOffset(_))));
    }

    #[test]
    fn test_aliased_strings_are_rejected() {
        // Two string slots sharing one tail
        let mut data = word(0x40);
        data.extend(word(0x40));
        data.extend(word(64));
        data.extend(vec![b'x'; 64]);

        let template = args(vec![AbiObject::leaf(ValueType::String), AbiObject::leaf(ValueType::String)]);
        let result = decode(&template, &data);
        assert!(matches!(result, Err(AbiError::InvalidOffset(_))));
    }

    // ==================== Truncation ====================

    #[test]
    fn test_decode_insufficient_data() {
        let result = decode(&args(vec![AbiObject::leaf(ValueType::Uint(256))]), &[0u8; 16]);
        assert!(matches!(
            result,
            Err(AbiError::TruncatedInput { needed: 32, available: 16 })
        ));
    }

    #[test]
    fn test_string_length_past_end() {
        let mut data = word(0x20);
        data.extend(word(100));
        data.extend(vec![0u8; 32]);
        let result = decode(&args(vec![AbiObject::leaf(ValueType::String)]), &data);
        assert!(matches!(result, Err(AbiError::TruncatedInput { .. })));
    }

    #[test]
    fn test_dynamic_list_count_too_large() {
        let mut data = word(0x20);
        data.extend(word(1_000));
        let template = args(vec![AbiObject::List(ListObject::new(
            ListType::Dynamic,
            AbiObject::leaf(ValueType::Uint(256)),
        ))]);
        let result = decode(&template, &data);
        assert!(matches!(result, Err(AbiError::TruncatedInput { .. })));
    }

    #[test]
    fn test_dynamic_len_limit() {
        let mut data = word(0x20);
        data.extend(word(4));
        data.extend(vec![0u8; 128]);
        let template = args(vec![AbiObject::List(ListObject::new(
            ListType::Dynamic,
            AbiObject::leaf(ValueType::Uint(256)),
        ))]);

        assert!(decode(&template, &data).is_ok());
        let config = CodecConfig::default().with_max_dynamic_len(3);
        let result = Decoder::new(&config).decode(&template, &data);
        assert!(matches!(result, Err(AbiError::TruncatedInput { .. })));
    }

    // ==================== Templates ====================

    #[test]
    fn test_template_is_reusable() {
        let template = args(vec![AbiObject::List(ListObject::new(
            ListType::Dynamic,
            AbiObject::leaf(ValueType::Uint(256)),
        ))]);
        let snapshot = template.clone();

        let mut one = template.clone();
        let list = one.as_struct_mut().unwrap().get_mut(0).unwrap().as_list_mut().unwrap();
        let mut item = list.new_element();
        item.set_value(Value::Uint(U256::from(5))).unwrap();
        list.push(item).unwrap();
        let encoded = encode(&one).unwrap();

        let first = decode(&template, &encoded).unwrap();
        let second = decode(&template, &encoded).unwrap();
        assert_eq!(first, one);
        assert_eq!(first, second);
        assert_eq!(template, snapshot);
    }

    #[test]
    fn test_empty_dynamic_list_round_trip() {
        let template = AbiObject::List(ListObject::new(ListType::Dynamic, AbiObject::leaf(ValueType::Bool)));
        let encoded = encode(&template).unwrap();
        assert_eq!(encoded, vec![0u8; 32]);
        let decoded = decode(&template, &encoded).unwrap();
        assert_eq!(decoded.as_list().unwrap().len(), 0);
        assert_eq!(decoded, template);
    }
}
