//! Contract interface model
//!
//! Parses the JSON contract-interface description into function, event and
//! constructor definitions. Each definition holds its ordered parameters and
//! caches its canonical signature and selector (4-byte function id or
//! 32-byte event topic), derived through an injected [`Hasher`].

use std::collections::HashMap;
use std::fmt;

use chainabi_crypto::{Hasher, Keccak256};
use chainabi_primitives::{Selector, H256};
use serde::Deserialize;

use crate::type_descriptor::{BaseType, TypeDescriptor, MAX_STATIC_ELEMENTS};
use crate::{AbiError, AbiResult};

/// A named, typed parameter of a function or event.
///
/// Tuple parameters carry their components recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    ty: TypeDescriptor,
    components: Vec<Param>,
    indexed: bool,
    struct_name: Option<String>,
}

impl Param {
    /// Create a non-tuple parameter from a type string
    pub fn new(name: impl Into<String>, ty: &str) -> AbiResult<Self> {
        let ty = TypeDescriptor::parse(ty)?;
        if ty.base_type() == BaseType::Tuple {
            return Err(AbiError::InvalidAbiDescription(format!(
                "tuple parameter '{}' needs components",
                ty
            )));
        }
        Ok(Self {
            name: name.into(),
            ty,
            components: Vec::new(),
            indexed: false,
            struct_name: None,
        })
    }

    /// Create a tuple parameter; `ty` is `tuple` plus optional dimensions
    pub fn tuple(
        name: impl Into<String>,
        ty: &str,
        components: Vec<Param>,
        struct_name: impl Into<String>,
    ) -> AbiResult<Self> {
        let ty = TypeDescriptor::parse(ty)?;
        if ty.base_type() != BaseType::Tuple {
            return Err(AbiError::InvalidAbiDescription(format!(
                "components given for non-tuple type {}",
                ty
            )));
        }
        if components.is_empty() {
            return Err(AbiError::InvalidAbiDescription(
                "tuple parameter has no components".to_string(),
            ));
        }
        Self {
            name: name.into(),
            ty,
            components,
            indexed: false,
            struct_name: Some(struct_name.into()),
        }
        .checked_static_size()
    }

    /// Leaves a template of this parameter holds, `None` on overflow
    fn static_leaves(&self) -> Option<usize> {
        let per_element = if self.components.is_empty() {
            1
        } else {
            self.components
                .iter()
                .try_fold(0usize, |acc, c| acc.checked_add(c.static_leaves()?))?
        };
        self.ty.static_elements()?.checked_mul(per_element)
    }

    /// Reject tuples whose fixed dimensions multiply past the static limit
    fn checked_static_size(self) -> AbiResult<Self> {
        match self.static_leaves() {
            Some(count) if count <= MAX_STATIC_ELEMENTS => Ok(self),
            _ => Err(AbiError::InvalidAbiDescription(format!(
                "parameter '{}' of type {} holds more than {} static values",
                self.name, self.canonical_type(), MAX_STATIC_ELEMENTS
            ))),
        }
    }

    pub(crate) fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark the parameter as indexed (events only)
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Parameter name (may be empty)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed type descriptor
    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Tuple components (empty for non-tuples)
    pub fn components(&self) -> &[Param] {
        &self.components
    }

    /// Whether the parameter is an indexed event parameter
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Struct name for tuple parameters
    pub fn struct_name(&self) -> Option<&str> {
        self.struct_name.as_deref()
    }

    /// Canonical type as used in signatures: tuples render as their
    /// parenthesised component list, e.g. `(string,int256)[]`.
    pub fn canonical_type(&self) -> String {
        if self.ty.base_type() == BaseType::Tuple {
            let inner: Vec<String> = self.components.iter().map(Param::canonical_type).collect();
            format!("({}){}", inner.join(","), self.ty.dimensions_suffix())
        } else {
            self.ty.to_string()
        }
    }

    /// Whether values of this parameter are encoded out of line
    pub fn is_dynamic(&self) -> bool {
        if self.ty.dimensions().contains(&0) {
            return true;
        }
        match self.ty.base_type() {
            BaseType::Tuple => self.components.iter().any(Param::is_dynamic),
            base => base.is_dynamic(),
        }
    }

    /// Element parameter of a list parameter, one dimension stripped
    pub fn element(&self) -> Option<Param> {
        let ty = self.ty.reduce_dimension_and_get_type()?;
        Some(Self {
            ty,
            ..self.clone()
        })
    }
}

/// Kind of a callable ABI entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Named function
    Function,
    /// Contract constructor
    Constructor,
    /// Fallback function
    Fallback,
    /// Plain value-transfer receive function
    Receive,
}

/// State mutability of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Reads nothing from state
    Pure,
    /// Reads but does not modify state
    View,
    /// Modifies state, rejects value
    NonPayable,
    /// Modifies state, accepts value
    Payable,
}

impl StateMutability {
    /// Resolve from the legacy `constant`/`payable` flags
    fn from_flags(constant: Option<bool>, payable: Option<bool>) -> Self {
        match (constant, payable) {
            (_, Some(true)) => StateMutability::Payable,
            (Some(true), _) => StateMutability::View,
            _ => StateMutability::NonPayable,
        }
    }
}

/// A function, constructor, fallback or receive definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    name: String,
    kind: FunctionKind,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    state_mutability: StateMutability,
    signature: String,
    selector: Selector,
}

impl FunctionDefinition {
    /// Create a definition, computing its signature and selector
    pub fn new(
        name: impl Into<String>,
        kind: FunctionKind,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
        state_mutability: StateMutability,
        hasher: &dyn Hasher,
    ) -> Self {
        let name = name.into();
        let signature = render_signature(&name, &inputs);
        let selector = Selector::from_hash(&hasher.hash(signature.as_bytes()));
        Self {
            name,
            kind,
            inputs,
            outputs,
            state_mutability,
            signature,
            selector,
        }
    }

    /// Function name (empty for constructor, fallback and receive)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry kind
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Input parameters
    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    /// Output parameters
    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    /// State mutability
    pub fn state_mutability(&self) -> StateMutability {
        self.state_mutability
    }

    /// Whether the function does not modify state
    pub fn is_constant(&self) -> bool {
        matches!(self.state_mutability, StateMutability::Pure | StateMutability::View)
    }

    /// Whether the function accepts value
    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// First four bytes of the signature hash
    pub fn selector(&self) -> Selector {
        self.selector
    }
}

/// An event definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    name: String,
    inputs: Vec<Param>,
    anonymous: bool,
    signature: String,
    topic: H256,
}

impl EventDefinition {
    /// Create an event definition, computing its signature and topic
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<Param>,
        anonymous: bool,
        hasher: &dyn Hasher,
    ) -> Self {
        let name = name.into();
        let signature = render_signature(&name, &inputs);
        let topic = hasher.hash(signature.as_bytes());
        Self {
            name,
            inputs,
            anonymous,
            signature,
            topic,
        }
    }

    /// Event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All parameters in declaration order
    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    /// Whether the event omits its topic from the log
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Canonical signature
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Full signature hash, the first log topic of non-anonymous events
    pub fn topic(&self) -> H256 {
        self.topic
    }

    /// Parameters carried in log topics
    pub fn indexed_inputs(&self) -> impl Iterator<Item = &Param> {
        self.inputs.iter().filter(|p| p.is_indexed())
    }

    /// Parameters carried in log data
    pub fn non_indexed_inputs(&self) -> impl Iterator<Item = &Param> {
        self.inputs.iter().filter(|p| !p.is_indexed())
    }
}

fn render_signature(name: &str, inputs: &[Param]) -> String {
    let types: Vec<String> = inputs.iter().map(Param::canonical_type).collect();
    format!("{}({})", name, types.join(","))
}

/// Parsed contract interface
#[derive(Debug, Clone, Default)]
pub struct ContractAbi {
    constructor: Option<FunctionDefinition>,
    fallback: Option<FunctionDefinition>,
    receive: Option<FunctionDefinition>,
    functions: HashMap<String, Vec<FunctionDefinition>>,
    events: HashMap<String, Vec<EventDefinition>>,
}

impl ContractAbi {
    /// Parse a JSON contract interface, deriving selectors with Keccak-256
    pub fn from_json(json: &str) -> AbiResult<Self> {
        Self::from_json_with_hasher(json, &Keccak256)
    }

    /// Parse a JSON contract interface with an injected hash function
    pub fn from_json_with_hasher(json: &str, hasher: &dyn Hasher) -> AbiResult<Self> {
        let entries: Vec<RawEntry> = serde_json::from_str(json)
            .map_err(|e| AbiError::InvalidAbiDescription(e.to_string()))?;

        let mut abi = ContractAbi::default();
        for entry in entries {
            abi.add_entry(entry, hasher)?;
        }

        tracing::debug!(
            functions = abi.functions.values().map(Vec::len).sum::<usize>(),
            events = abi.events.values().map(Vec::len).sum::<usize>(),
            constructor = abi.constructor.is_some(),
            "parsed contract ABI"
        );
        Ok(abi)
    }

    fn add_entry(&mut self, entry: RawEntry, hasher: &dyn Hasher) -> AbiResult<()> {
        let kind = entry
            .kind
            .as_deref()
            .ok_or_else(|| AbiError::InvalidAbiDescription("entry without 'type'".to_string()))?;
        let inputs = parse_params(&entry.inputs)?;
        let outputs = parse_params(&entry.outputs)?;
        let state_mutability = entry
            .state_mutability
            .unwrap_or_else(|| StateMutability::from_flags(entry.constant, entry.payable));

        match kind {
            "function" => {
                let name = required_name(&entry, kind)?;
                let function = FunctionDefinition::new(
                    name,
                    FunctionKind::Function,
                    inputs,
                    outputs,
                    state_mutability,
                    hasher,
                );
                let overloads = self.functions.entry(function.name.clone()).or_default();
                if overloads.iter().any(|f| f.signature == function.signature) {
                    return Err(AbiError::InvalidAbiDescription(format!(
                        "duplicate function {}",
                        function.signature
                    )));
                }
                overloads.push(function);
            }
            "event" => {
                let name = required_name(&entry, kind)?;
                let event = EventDefinition::new(name, inputs, entry.anonymous, hasher);
                let overloads = self.events.entry(event.name.clone()).or_default();
                if overloads.iter().any(|e| e.signature == event.signature) {
                    return Err(AbiError::InvalidAbiDescription(format!(
                        "duplicate event {}",
                        event.signature
                    )));
                }
                overloads.push(event);
            }
            "constructor" | "fallback" | "receive" => {
                let (slot, kind) = match kind {
                    "constructor" => (&mut self.constructor, FunctionKind::Constructor),
                    "fallback" => (&mut self.fallback, FunctionKind::Fallback),
                    _ => (&mut self.receive, FunctionKind::Receive),
                };
                if slot.is_some() {
                    return Err(AbiError::InvalidAbiDescription(format!(
                        "more than one {:?} entry",
                        kind
                    )));
                }
                *slot = Some(FunctionDefinition::new(
                    "",
                    kind,
                    inputs,
                    outputs,
                    state_mutability,
                    hasher,
                ));
            }
            other => {
                return Err(AbiError::InvalidAbiDescription(format!(
                    "unknown entry type '{}'",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Constructor, if declared
    pub fn constructor(&self) -> Option<&FunctionDefinition> {
        self.constructor.as_ref()
    }

    /// Whether a fallback function is declared
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Whether a receive function is declared
    pub fn has_receive(&self) -> bool {
        self.receive.is_some()
    }

    /// All overloads of a function, in declaration order
    pub fn functions(&self, name: &str) -> &[FunctionDefinition] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First declared overload of a function
    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions(name).first()
    }

    /// Iterate over every named function
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.functions.values().flatten()
    }

    /// Find a function by its 4-byte selector
    pub fn function_by_selector(&self, selector: &Selector) -> Option<&FunctionDefinition> {
        self.all_functions().find(|f| &f.selector == selector)
    }

    /// All overloads of an event, in declaration order
    pub fn events(&self, name: &str) -> &[EventDefinition] {
        self.events.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First declared overload of an event
    pub fn event(&self, name: &str) -> Option<&EventDefinition> {
        self.events(name).first()
    }

    /// Iterate over every event
    pub fn all_events(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.values().flatten()
    }

    /// Find a non-anonymous event by its topic
    pub fn event_by_topic(&self, topic: &H256) -> Option<&EventDefinition> {
        self.all_events().find(|e| !e.anonymous && &e.topic == topic)
    }
}

impl fmt::Display for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

// ==================== JSON model ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    state_mutability: Option<StateMutability>,
    constant: Option<bool>,
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    components: Option<Vec<RawParam>>,
    #[serde(default)]
    indexed: bool,
    internal_type: Option<String>,
}

fn required_name(entry: &RawEntry, kind: &str) -> AbiResult<String> {
    match entry.name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AbiError::InvalidAbiDescription(format!("{} entry without 'name'", kind))),
    }
}

fn parse_params(raw: &[RawParam]) -> AbiResult<Vec<Param>> {
    raw.iter()
        .enumerate()
        .map(|(index, param)| parse_param(param, index))
        .collect()
}

fn parse_param(raw: &RawParam, index: usize) -> AbiResult<Param> {
    let ty = raw.kind.as_deref().ok_or_else(|| {
        AbiError::InvalidAbiDescription(format!("parameter '{}' without 'type'", raw.name))
    })?;
    let ty = TypeDescriptor::parse(ty)?;

    let components = match (&raw.components, ty.base_type()) {
        (Some(components), BaseType::Tuple) if !components.is_empty() => parse_params(components)?,
        (_, BaseType::Tuple) => {
            return Err(AbiError::InvalidAbiDescription(format!(
                "tuple parameter '{}' without components",
                raw.name
            )))
        }
        (Some(components), _) if !components.is_empty() => {
            return Err(AbiError::InvalidAbiDescription(format!(
                "parameter '{}' of type {} has components",
                raw.name, ty
            )))
        }
        _ => Vec::new(),
    };

    let struct_name = (ty.base_type() == BaseType::Tuple).then(|| {
        raw.internal_type
            .as_deref()
            .and_then(struct_name_from_internal_type)
            .unwrap_or_else(|| format!("Struct{}", index))
    });

    Param {
        name: raw.name.clone(),
        ty,
        components,
        indexed: raw.indexed,
        struct_name,
    }
    .checked_static_size()
}

/// `"struct Proxy.Info[]"` -> `"Info"`
fn struct_name_from_internal_type(internal: &str) -> Option<String> {
    let name = internal.strip_prefix("struct ")?;
    let name = name.split('[').next().unwrap_or(name);
    let name = name.rsplit('.').next().unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}
