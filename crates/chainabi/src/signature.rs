//! Human-readable signatures
//!
//! Builds definitions from text such as `transfer(address,uint256)` or
//! `Transfer(address indexed from, address indexed to, uint256 value)`.
//! Tuples are written as parenthesised component lists, optionally followed
//! by list dimensions: `submit((string,int256)[],bytes)`.

use chainabi_crypto::Hasher;

use crate::contract::{EventDefinition, FunctionDefinition, FunctionKind, Param, StateMutability};
use crate::{AbiError, AbiResult};

impl FunctionDefinition {
    /// Parse `name(inputs)` with an optional trailing `(outputs)` group.
    ///
    /// Tuple components get synthetic struct names (`Struct0`, `Struct1`, ...)
    /// by position, as for interfaces without `internalType`.
    pub fn from_signature(signature: &str, hasher: &dyn Hasher) -> AbiResult<Self> {
        let (name, inputs, rest) = split_signature(signature)?;
        let outputs = match rest.trim() {
            "" => Vec::new(),
            rest => {
                let (group, tail) = take_group(rest, signature)?;
                if !tail.trim().is_empty() {
                    return Err(malformed(signature, "trailing characters"));
                }
                parse_list(group)?
            }
        };
        Ok(FunctionDefinition::new(
            name,
            FunctionKind::Function,
            parse_list(inputs)?,
            outputs,
            StateMutability::NonPayable,
            hasher,
        ))
    }
}

impl EventDefinition {
    /// Parse `Name(inputs)`; parameters may carry the `indexed` keyword.
    pub fn from_signature(signature: &str, anonymous: bool, hasher: &dyn Hasher) -> AbiResult<Self> {
        let (name, inputs, rest) = split_signature(signature)?;
        if !rest.trim().is_empty() {
            return Err(malformed(signature, "trailing characters"));
        }
        Ok(EventDefinition::new(name, parse_list(inputs)?, anonymous, hasher))
    }
}

fn malformed(text: &str, reason: &str) -> AbiError {
    AbiError::MalformedType(format!("{} in '{}'", reason, text))
}

/// `name(inner)rest` -> (`name`, `inner`, `rest`)
fn split_signature(signature: &str) -> AbiResult<(&str, &str, &str)> {
    let signature = signature.trim();
    let open = signature
        .find('(')
        .ok_or_else(|| malformed(signature, "missing parameter list"))?;
    let name = signature[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return Err(malformed(signature, "invalid name"));
    }
    let (inner, rest) = take_group(&signature[open..], signature)?;
    Ok((name, inner, rest))
}

/// Split a leading balanced `( ... )` group off `text`
fn take_group<'s>(text: &'s str, context: &str) -> AbiResult<(&'s str, &'s str)> {
    if !text.starts_with('(') {
        return Err(malformed(context, "expected '('"));
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&text[1..i], &text[i + 1..]));
                }
            }
            _ => {}
        }
    }
    Err(malformed(context, "unbalanced parentheses"))
}

/// Comma-separated parameters at nesting depth zero
fn parse_list(text: &str) -> AbiResult<Vec<Param>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&text[start..]);

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_item(item, index))
        .collect()
}

/// `type [indexed] [name]`, where `type` may be a parenthesised tuple
fn parse_item(item: &str, index: usize) -> AbiResult<Param> {
    let item = item.trim();
    if item.is_empty() {
        return Err(malformed(item, "empty parameter"));
    }

    let (param, rest) = if item.starts_with('(') {
        let (inner, rest) = take_group(item, item)?;
        let (dims, rest) = split_word(rest);
        let components = parse_list(inner)?;
        let param = Param::tuple("", &format!("tuple{}", dims), components, format!("Struct{}", index))?;
        (param, rest)
    } else {
        let (ty, rest) = split_word(item);
        (Param::new("", ty)?, rest)
    };

    let mut words = rest.split_whitespace().peekable();
    let indexed = words.next_if_eq(&"indexed").is_some();
    let name = words.next().unwrap_or_default();
    if words.next().is_some() {
        return Err(malformed(item, "unexpected words"));
    }
    Ok(param.named(name).indexed(indexed))
}

/// Leading run of non-whitespace characters and the remainder
fn split_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}
