//! String / JSON parameter wrapper
//!
//! Converts between user-facing positional string parameters and value
//! trees. Lists and structs are given as JSON array text; scalars as plain
//! text. Byte-valued parameters accept several textual encodings:
//!
//! - `hex://<hex>` and `base64://<base64>` force a format;
//! - for `bytesN`, unprefixed text is hex if it decodes to exactly `N`
//!   bytes, else raw UTF-8 if it is exactly `N` bytes long, else base64 if
//!   that decodes to `N` bytes;
//! - for `bytes`, unprefixed text is taken as raw UTF-8.
//!
//! Structs accept a JSON array in field order or a JSON object keyed by
//! field name. Structs built from signature text have unnamed fields and
//! take positional arrays only.
//!
//! Decoded values render as decimal integers, `true`/`false`, plain strings,
//! `0x` hex addresses, and bytes in the configured format (hex for `bytesN`,
//! base64 for `bytes` by default). Lists and structs render as
//! `[ a, b, c ]`, with nested strings quoted so the text is valid JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chainabi_primitives::{parse_uint, Address, IntError, I256};
use serde_json::Value as Json;

use crate::abi::{AbiObject, Decoder, Field, Leaf, ListObject, ListType, StructObject, Value, ValueType};
use crate::config::{BytesFormat, CodecConfig};
use crate::{AbiError, AbiResult};

const HEX_PREFIX: &str = "hex://";
const BASE64_PREFIX: &str = "base64://";

/// Build a populated tree from positional string parameters (default config)
pub fn encode<S: AsRef<str>>(template: &AbiObject, params: &[S]) -> AbiResult<AbiObject> {
    JsonWrapper::new(&CodecConfig::default()).encode(template, params)
}

/// Decode `data` and render each top-level parameter (default config)
pub fn decode(template: &AbiObject, data: &[u8]) -> AbiResult<Vec<String>> {
    JsonWrapper::new(&CodecConfig::default()).decode(template, data)
}

/// String/JSON wrapper around the value tree
#[derive(Debug, Clone, Copy)]
pub struct JsonWrapper<'a> {
    config: &'a CodecConfig,
}

impl<'a> JsonWrapper<'a> {
    /// Create a wrapper
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config }
    }

    /// Fill `template` (a top-level parameter struct) from positional strings.
    pub fn encode<S: AsRef<str>>(&self, template: &AbiObject, params: &[S]) -> AbiResult<AbiObject> {
        let top = top_level(template)?;
        check_arity(top.len(), params.len())?;

        let fields = top
            .fields()
            .iter()
            .zip(params)
            .map(|(field, text)| {
                Ok(Field {
                    name: field.name.clone(),
                    value: self.fill_from_text(&field.value, text.as_ref())?,
                })
            })
            .collect::<AbiResult<Vec<_>>>()?;
        Ok(AbiObject::Struct(StructObject::new(top.name(), fields)))
    }

    /// Fill `template` from a JSON array of parameters
    pub fn encode_json(&self, template: &AbiObject, params: &[Json]) -> AbiResult<AbiObject> {
        let top = top_level(template)?;
        check_arity(top.len(), params.len())?;

        let fields = top
            .fields()
            .iter()
            .zip(params)
            .map(|(field, json)| {
                Ok(Field {
                    name: field.name.clone(),
                    value: self.fill_from_json(&field.value, json)?,
                })
            })
            .collect::<AbiResult<Vec<_>>>()?;
        Ok(AbiObject::Struct(StructObject::new(top.name(), fields)))
    }

    /// Decode `data` against `template` and render each top-level parameter.
    pub fn decode(&self, template: &AbiObject, data: &[u8]) -> AbiResult<Vec<String>> {
        let decoded = Decoder::new(self.config).decode(template, data)?;
        self.to_strings(&decoded)
    }

    /// Render each field of a populated top-level struct
    pub fn to_strings(&self, decoded: &AbiObject) -> AbiResult<Vec<String>> {
        top_level(decoded)?
            .values()
            .map(|value| self.render(value))
            .collect()
    }

    /// Render a single populated node as a pretty string
    pub fn render(&self, object: &AbiObject) -> AbiResult<String> {
        match object {
            AbiObject::Value(leaf) => self.render_leaf(leaf),
            _ => self.render_nested(object),
        }
    }

    // ==================== Text -> tree ====================

    fn fill_from_text(&self, template: &AbiObject, text: &str) -> AbiResult<AbiObject> {
        match template {
            AbiObject::Value(leaf) => leaf_from_text(leaf.value_type(), text),
            _ => {
                let json: Json = serde_json::from_str(text).map_err(|e| AbiError::InvalidValue {
                    ty: template.type_string(),
                    reason: format!("expected a JSON array: {}", e),
                })?;
                self.fill_from_json(template, &json)
            }
        }
    }

    fn fill_from_json(&self, template: &AbiObject, json: &Json) -> AbiResult<AbiObject> {
        match (template, json) {
            (AbiObject::Value(leaf), json) => {
                let ty = leaf.value_type();
                match json {
                    Json::String(s) => leaf_from_text(ty, s),
                    Json::Number(n) => leaf_from_text(ty, &n.to_string()),
                    Json::Bool(b) => leaf_from_text(ty, if *b { "true" } else { "false" }),
                    other => Err(AbiError::InvalidValue {
                        ty: ty.to_string(),
                        reason: format!("unexpected JSON {}", other),
                    }),
                }
            }
            // Nested parameters may arrive as JSON text inside a string
            (_, Json::String(text)) => self.fill_from_text(template, text),
            (AbiObject::Struct(s), Json::Array(values)) => {
                check_arity(s.len(), values.len())?;
                let fields = s
                    .fields()
                    .iter()
                    .zip(values)
                    .map(|(field, json)| {
                        Ok(Field {
                            name: field.name.clone(),
                            value: self.fill_from_json(&field.value, json)?,
                        })
                    })
                    .collect::<AbiResult<Vec<_>>>()?;
                Ok(AbiObject::Struct(StructObject::new(s.name(), fields)))
            }
            (AbiObject::Struct(s), Json::Object(map)) => {
                if s.fields().iter().any(|field| field.name.is_empty()) {
                    return Err(AbiError::InvalidValue {
                        ty: template.type_string(),
                        reason: "struct fields are unnamed; pass a JSON array in field order".to_string(),
                    });
                }
                check_arity(s.len(), map.len())?;
                let fields = s
                    .fields()
                    .iter()
                    .map(|field| {
                        let json = map.get(&field.name).ok_or_else(|| AbiError::InvalidValue {
                            ty: template.type_string(),
                            reason: format!("missing field '{}'", field.name),
                        })?;
                        Ok(Field {
                            name: field.name.clone(),
                            value: self.fill_from_json(&field.value, json)?,
                        })
                    })
                    .collect::<AbiResult<Vec<_>>>()?;
                Ok(AbiObject::Struct(StructObject::new(s.name(), fields)))
            }
            (AbiObject::List(list), Json::Array(values)) => {
                if let ListType::Static(len) = list.list_type() {
                    check_arity(len, values.len())?;
                }
                let items = values
                    .iter()
                    .map(|json| self.fill_from_json(list.element(), json))
                    .collect::<AbiResult<Vec<_>>>()?;
                Ok(AbiObject::List(ListObject::from_parts(
                    list.list_type(),
                    list.new_element(),
                    items,
                )))
            }
            (template, other) => Err(AbiError::InvalidValue {
                ty: template.type_string(),
                reason: format!("expected a JSON array, got {}", other),
            }),
        }
    }

    // ==================== Tree -> text ====================

    fn render_leaf(&self, leaf: &Leaf) -> AbiResult<String> {
        let value = leaf
            .value()
            .ok_or_else(|| AbiError::MissingValue(leaf.value_type().to_string()))?;
        Ok(match value {
            Value::Uint(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Address(addr) => addr.to_hex(),
            Value::FixedBytes(bytes) => format_bytes(bytes, self.config.fixed_bytes_format),
            Value::Bytes(bytes) => format_bytes(bytes, self.config.dynamic_bytes_format),
            Value::String(s) => s.clone(),
        })
    }

    fn render_nested(&self, object: &AbiObject) -> AbiResult<String> {
        match object {
            AbiObject::Value(leaf) => {
                let text = self.render_leaf(leaf)?;
                match leaf.value_type() {
                    ValueType::Uint(_) | ValueType::Int(_) | ValueType::Bool => Ok(text),
                    _ => Ok(serde_json::to_string(&text)?),
                }
            }
            AbiObject::Struct(s) => bracket(s.values().map(|v| self.render_nested(v))),
            AbiObject::List(list) => bracket(list.items().iter().map(|v| self.render_nested(v))),
        }
    }
}

fn top_level(template: &AbiObject) -> AbiResult<&StructObject> {
    template.as_struct().ok_or_else(|| AbiError::TypeMismatch {
        expected: "parameter list".to_string(),
        got: template.type_string(),
    })
}

fn check_arity(expected: usize, got: usize) -> AbiResult<()> {
    if expected != got {
        return Err(AbiError::ArityMismatch { expected, got });
    }
    Ok(())
}

fn bracket(items: impl Iterator<Item = AbiResult<String>>) -> AbiResult<String> {
    let items = items.collect::<AbiResult<Vec<_>>>()?;
    if items.is_empty() {
        Ok("[ ]".to_string())
    } else {
        Ok(format!("[ {} ]", items.join(", ")))
    }
}

fn format_bytes(bytes: &[u8], format: BytesFormat) -> String {
    match format {
        BytesFormat::Hex => format!("0x{}", hex::encode(bytes)),
        BytesFormat::Base64 => STANDARD.encode(bytes),
    }
}

fn int_error(ty: ValueType, text: &str, e: IntError) -> AbiError {
    match e {
        IntError::Overflow(_) => AbiError::NumericOverflow {
            value: text.to_string(),
            ty: ty.to_string(),
        },
        IntError::InvalidLiteral(_) => AbiError::InvalidValue {
            ty: ty.to_string(),
            reason: format!("'{}' is not a decimal or hex integer", text),
        },
    }
}

/// Leaf populated from its textual form
pub(crate) fn leaf_from_text(ty: ValueType, text: &str) -> AbiResult<AbiObject> {
    let value = match ty {
        ValueType::Uint(_) => Value::Uint(parse_uint(text).map_err(|e| int_error(ty, text, e))?),
        ValueType::Int(_) => Value::Int(I256::parse(text).map_err(|e| int_error(ty, text, e))?),
        ValueType::Bool => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => {
                return Err(AbiError::InvalidValue {
                    ty: ty.to_string(),
                    reason: format!("'{}' is not true or false", text),
                })
            }
        },
        ValueType::Address => Value::Address(Address::from_hex(text).map_err(|e| {
            AbiError::InvalidValue {
                ty: ty.to_string(),
                reason: e.to_string(),
            }
        })?),
        ValueType::FixedBytes(size) => Value::FixedBytes(sniff_bytes(text, Some(size))?),
        ValueType::Bytes => Value::Bytes(sniff_bytes(text, None)?),
        ValueType::String => Value::String(text.to_string()),
    };
    Ok(AbiObject::Value(Leaf::with_value(ty, value)?))
}

/// Interpret byte-valued text; `expected` is the length of a `bytesN` leaf.
pub(crate) fn sniff_bytes(text: &str, expected: Option<usize>) -> AbiResult<Vec<u8>> {
    if let Some(rest) = text.strip_prefix(HEX_PREFIX) {
        let bytes = decode_hex(rest)
            .ok_or_else(|| AbiError::UnsupportedEncoding(format!("invalid hex in '{}'", text)))?;
        return check_bytes_len(text, bytes, expected);
    }
    if let Some(rest) = text.strip_prefix(BASE64_PREFIX) {
        let bytes = STANDARD
            .decode(rest)
            .map_err(|e| AbiError::UnsupportedEncoding(format!("invalid base64 in '{}': {}", text, e)))?;
        return check_bytes_len(text, bytes, expected);
    }

    let Some(size) = expected else {
        return Ok(text.as_bytes().to_vec());
    };
    if let Some(bytes) = decode_hex(text).filter(|b| b.len() == size) {
        return Ok(bytes);
    }
    if text.len() == size {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(bytes) = STANDARD.decode(text).ok().filter(|b| b.len() == size) {
        return Ok(bytes);
    }
    Err(AbiError::UnsupportedEncoding(format!(
        "'{}' is not {} bytes of hex, text or base64",
        text, size
    )))
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).ok()
}

fn check_bytes_len(text: &str, bytes: Vec<u8>, expected: Option<usize>) -> AbiResult<Vec<u8>> {
    match expected {
        Some(size) if bytes.len() != size => Err(AbiError::UnsupportedEncoding(format!(
            "'{}' decodes to {} bytes, expected {}",
            text,
            bytes.len(),
            size
        ))),
        _ => Ok(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainabi_primitives::U256;

    fn params(types: &[ValueType]) -> AbiObject {
        let fields = types
            .iter()
            .map(|ty| Field {
                name: String::new(),
                value: AbiObject::leaf(*ty),
            })
            .collect();
        AbiObject::Struct(StructObject::new("", fields))
    }

    fn first(tree: &AbiObject) -> &Value {
        tree.as_struct().unwrap().get(0).unwrap().value().unwrap()
    }

    // ==================== Sniffing ====================

    #[test]
    fn test_sniff_prefixed() {
        assert_eq!(sniff_bytes("hex://0x6162", None).unwrap(), b"ab");
        assert_eq!(sniff_bytes("hex://6162", Some(2)).unwrap(), b"ab");
        assert_eq!(sniff_bytes("base64://YWI=", None).unwrap(), b"ab");
        assert!(matches!(
            sniff_bytes("hex://6162", Some(3)),
            Err(AbiError::UnsupportedEncoding(_))
        ));
        assert!(matches!(sniff_bytes("hex://zz", None), Err(AbiError::UnsupportedEncoding(_))));
    }

    #[test]
    fn test_sniff_dynamic_defaults_to_text() {
        assert_eq!(sniff_bytes("6162", None).unwrap(), b"6162");
        assert_eq!(sniff_bytes("YWI=", None).unwrap(), b"YWI=");
    }

    #[test]
    fn test_sniff_fixed_precedence() {
        // Hex of the exact length wins
        assert_eq!(sniff_bytes("0x61626364", Some(4)).unwrap(), b"abcd");
        assert_eq!(sniff_bytes("61626364", Some(4)).unwrap(), b"abcd");
        // Valid hex of the wrong length falls through to plain text
        assert_eq!(sniff_bytes("6162", Some(4)).unwrap(), b"6162");
        // Plain text of the exact length
        assert_eq!(sniff_bytes("wxyz", Some(4)).unwrap(), b"wxyz");
        // Base64 as the last resort
        assert_eq!(sniff_bytes("YWJjZA==", Some(4)).unwrap(), b"abcd");
        assert!(matches!(sniff_bytes("abc", Some(4)), Err(AbiError::UnsupportedEncoding(_))));
    }

    // ==================== Scalars from text ====================

    #[test]
    fn test_encode_scalars() {
        let template = params(&[ValueType::Uint(256), ValueType::Int(64), ValueType::Bool, ValueType::Address]);
        let tree = encode(&template, &["0x10", "-5", "true", "0x1"]).unwrap();
        let s = tree.as_struct().unwrap();
        assert_eq!(s.get(0).unwrap().value(), Some(&Value::Uint(U256::from(16))));
        assert_eq!(s.get(1).unwrap().value(), Some(&Value::Int(I256::from_i128(-5))));
        assert_eq!(s.get(2).unwrap().value(), Some(&Value::Bool(true)));
        assert_eq!(
            s.get(3).unwrap().value(),
            Some(&Value::Address(Address::from_hex("0x1").unwrap()))
        );
    }

    #[test]
    fn test_encode_errors() {
        let template = params(&[ValueType::Uint(8)]);
        assert!(matches!(encode(&template, &["256"]), Err(AbiError::NumericOverflow { .. })));
        assert!(matches!(encode(&template, &["abc"]), Err(AbiError::InvalidValue { .. })));
        assert!(matches!(
            encode(&template, &["1", "2"]),
            Err(AbiError::ArityMismatch { expected: 1, got: 2 })
        ));
        let template = params(&[ValueType::Bool]);
        assert!(matches!(encode(&template, &["yes"]), Err(AbiError::InvalidValue { .. })));
    }

    // ==================== Lists and structs ====================

    #[test]
    fn test_empty_array_literal() {
        let list = AbiObject::List(ListObject::new(ListType::Dynamic, AbiObject::leaf(ValueType::Uint(256))));
        let template = AbiObject::Struct(StructObject::new(
            "",
            vec![Field { name: "xs".into(), value: list }],
        ));
        let tree = encode(&template, &["[]"]).unwrap();
        let xs = tree.as_struct().unwrap().get(0).unwrap().as_list().unwrap();
        assert!(xs.is_empty());
        assert_eq!(xs.list_type(), ListType::Dynamic);
    }

    #[test]
    fn test_static_list_arity() {
        let list = AbiObject::List(ListObject::new(ListType::Static(2), AbiObject::leaf(ValueType::Bool)));
        let template = AbiObject::Struct(StructObject::new(
            "",
            vec![Field { name: "xs".into(), value: list }],
        ));
        assert!(encode(&template, &["[true, false]"]).is_ok());
        assert!(matches!(
            encode(&template, &["[true]"]),
            Err(AbiError::ArityMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_struct_from_object() {
        let point = AbiObject::Struct(StructObject::new(
            "Point",
            vec![
                Field { name: "x".into(), value: AbiObject::leaf(ValueType::Int(256)) },
                Field { name: "label".into(), value: AbiObject::leaf(ValueType::String) },
            ],
        ));
        let template = AbiObject::Struct(StructObject::new("", vec![Field { name: "p".into(), value: point }]));

        let by_position = encode(&template, &[r#"[-1, "origin"]"#]).unwrap();
        let by_name = encode(&template, &[r#"{"label": "origin", "x": -1}"#]).unwrap();
        assert_eq!(by_position, by_name);
    }

    // ==================== Rendering ====================

    #[test]
    fn test_render_scalars() {
        let template = params(&[
            ValueType::Uint(256),
            ValueType::Int(256),
            ValueType::Bool,
            ValueType::Address,
            ValueType::String,
            ValueType::Bytes,
            ValueType::FixedBytes(2),
        ]);
        let tree = encode(&template, &["7", "-7", "false", "0x1", "hi", "ab", "0xabcd"]).unwrap();
        let strings = JsonWrapper::new(&CodecConfig::default()).to_strings(&tree).unwrap();
        assert_eq!(
            strings,
            vec![
                "7",
                "-7",
                "false",
                "0x0000000000000000000000000000000000000001",
                "hi",
                "YWI=",
                "0xabcd",
            ]
        );
    }

    #[test]
    fn test_render_lists() {
        let strings_list = AbiObject::List(ListObject::new(ListType::Dynamic, AbiObject::leaf(ValueType::String)));
        let nested = AbiObject::List(ListObject::new(
            ListType::Dynamic,
            AbiObject::List(ListObject::new(ListType::Static(2), AbiObject::leaf(ValueType::Uint(8)))),
        ));
        let empty = AbiObject::List(ListObject::new(ListType::Dynamic, AbiObject::leaf(ValueType::Bool)));
        let template = AbiObject::Struct(StructObject::new(
            "",
            vec![
                Field { name: "a".into(), value: strings_list },
                Field { name: "b".into(), value: nested },
                Field { name: "c".into(), value: empty },
            ],
        ));
        let tree = encode(&template, &[r#"["x", "y \"z\""]"#, "[[1, 2], [3, 4]]", "[]"]).unwrap();
        let strings = JsonWrapper::new(&CodecConfig::default()).to_strings(&tree).unwrap();
        assert_eq!(strings[0], r#"[ "x", "y \"z\"" ]"#);
        assert_eq!(strings[1], "[ [ 1, 2 ], [ 3, 4 ] ]");
        assert_eq!(strings[2], "[ ]");
    }

    #[test]
    fn test_render_with_base64_fixed_bytes() {
        let config = CodecConfig::default().with_fixed_bytes_format(BytesFormat::Base64);
        let tree = encode(&params(&[ValueType::FixedBytes(2)]), &["0x6162"]).unwrap();
        let strings = JsonWrapper::new(&config).to_strings(&tree).unwrap();
        assert_eq!(strings, vec!["YWI="]);
        assert_eq!(first(&tree), &Value::FixedBytes(b"ab".to_vec()));
    }

    #[test]
    fn test_render_unset_leaf_fails() {
        let result = JsonWrapper::new(&CodecConfig::default()).to_strings(&params(&[ValueType::Bool]));
        assert!(matches!(result, Err(AbiError::MissingValue(_))));
    }
}
