//! Method, constructor and event level codec

use std::fmt;

use bytes::Bytes;
use chainabi_crypto::{Hasher, Keccak256};
use chainabi_primitives::{PrimitiveError, Selector, H256};

use crate::abi::{
    create_event_data_object, create_input_object, create_object, create_output_object, encode,
    AbiObject, Decoder, Value,
};
use crate::config::CodecConfig;
use crate::contract::{ContractAbi, EventDefinition, FunctionDefinition, Param};
use crate::wrapper::{leaf_from_text, JsonWrapper};
use crate::{AbiError, AbiResult};

/// Contract-level codec: selectors, constructor data and event logs on top
/// of the string wrapper.
pub struct AbiCodec {
    hasher: Box<dyn Hasher>,
    config: CodecConfig,
}

impl AbiCodec {
    /// Codec with Keccak-256 and the default configuration
    pub fn new() -> Self {
        Self::with_hasher(Keccak256)
    }

    /// Codec with an injected hash function
    pub fn with_hasher(hasher: impl Hasher + 'static) -> Self {
        Self {
            hasher: Box::new(hasher),
            config: CodecConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Hash function used for selectors and topics
    pub fn hasher(&self) -> &dyn Hasher {
        self.hasher.as_ref()
    }

    /// Parse a JSON contract interface with this codec's hash function
    pub fn parse_abi(&self, json: &str) -> AbiResult<ContractAbi> {
        ContractAbi::from_json_with_hasher(json, self.hasher())
    }

    fn wrapper(&self) -> JsonWrapper<'_> {
        JsonWrapper::new(&self.config)
    }

    // ==================== Calls ====================

    /// Encode a call to the first overload of `name` taking `params.len()`
    /// arguments: selector followed by the encoded arguments.
    pub fn encode_method<S: AsRef<str>>(
        &self,
        abi: &ContractAbi,
        name: &str,
        params: &[S],
    ) -> AbiResult<Bytes> {
        let overloads = abi.functions(name);
        let function = match overloads.iter().find(|f| f.inputs().len() == params.len()) {
            Some(function) => function,
            None => {
                let first = overloads
                    .first()
                    .ok_or_else(|| AbiError::NotFound(format!("function '{}'", name)))?;
                return Err(AbiError::ArityMismatch {
                    expected: first.inputs().len(),
                    got: params.len(),
                });
            }
        };
        self.encode_function(function, params)
    }

    /// Encode a call to the function with the given selector
    pub fn encode_method_by_id<S: AsRef<str>>(
        &self,
        abi: &ContractAbi,
        selector: &Selector,
        params: &[S],
    ) -> AbiResult<Bytes> {
        let function = abi
            .function_by_selector(selector)
            .ok_or_else(|| AbiError::NotFound(format!("function with selector {}", selector)))?;
        self.encode_function(function, params)
    }

    /// Encode a call described by a signature such as `transfer(address,uint256)`
    pub fn encode_method_by_interface<S: AsRef<str>>(
        &self,
        signature: &str,
        params: &[S],
    ) -> AbiResult<Bytes> {
        let function = FunctionDefinition::from_signature(signature, self.hasher())?;
        self.encode_function(&function, params)
    }

    /// Encode a call to `function`
    pub fn encode_function<S: AsRef<str>>(
        &self,
        function: &FunctionDefinition,
        params: &[S],
    ) -> AbiResult<Bytes> {
        let args = self.wrapper().encode(&create_input_object(function), params)?;
        let encoded = encode(&args)?;

        let mut out = Vec::with_capacity(Selector::LEN + encoded.len());
        out.extend_from_slice(function.selector().as_bytes());
        out.extend_from_slice(&encoded);
        tracing::debug!(function = %function.signature(), bytes = out.len(), "encoded call");
        Ok(Bytes::from(out))
    }

    /// Deployment data: `bytecode` followed by the encoded constructor
    /// arguments. Without a declared constructor no arguments are accepted.
    pub fn encode_constructor<S: AsRef<str>>(
        &self,
        abi: &ContractAbi,
        bytecode: &[u8],
        params: &[S],
    ) -> AbiResult<Bytes> {
        let template = match abi.constructor() {
            Some(constructor) => create_input_object(constructor),
            None => create_object("", std::iter::empty::<&Param>()),
        };
        let encoded = encode(&self.wrapper().encode(&template, params)?)?;

        let mut out = Vec::with_capacity(bytecode.len() + encoded.len());
        out.extend_from_slice(bytecode);
        out.extend_from_slice(&encoded);
        Ok(Bytes::from(out))
    }

    /// Decode call data for one of the overloads of `name`, selected by the
    /// leading 4-byte selector.
    pub fn decode_method_input(
        &self,
        abi: &ContractAbi,
        name: &str,
        calldata: &[u8],
    ) -> AbiResult<Vec<String>> {
        let (selector, args) = split_selector(calldata)?;
        let function = abi
            .functions(name)
            .iter()
            .find(|f| f.selector() == selector)
            .ok_or_else(|| {
                AbiError::NotFound(format!("function '{}' with selector {}", name, selector))
            })?;
        self.wrapper().decode(&create_input_object(function), args)
    }

    /// Decode call data for whichever function its selector names
    pub fn decode_method_input_by_id(
        &self,
        abi: &ContractAbi,
        calldata: &[u8],
    ) -> AbiResult<Vec<String>> {
        let (selector, args) = split_selector(calldata)?;
        let function = abi
            .function_by_selector(&selector)
            .ok_or_else(|| AbiError::NotFound(format!("function with selector {}", selector)))?;
        self.wrapper().decode(&create_input_object(function), args)
    }

    /// Decode the return data of the first overload of `name`
    pub fn decode_method_output(
        &self,
        abi: &ContractAbi,
        name: &str,
        return_data: &[u8],
    ) -> AbiResult<Vec<String>> {
        let function = abi
            .function(name)
            .ok_or_else(|| AbiError::NotFound(format!("function '{}'", name)))?;
        self.wrapper().decode(&create_output_object(function), return_data)
    }

    // ==================== Events ====================

    /// Decode a log of the first event named `name`.
    ///
    /// Returns every parameter in declaration order. Indexed parameters are
    /// read from `topics`; those stored as a hash (strings, bytes, lists and
    /// structs) render as the topic's `0x` hex.
    pub fn decode_event(
        &self,
        abi: &ContractAbi,
        name: &str,
        topics: &[H256],
        data: &[u8],
    ) -> AbiResult<Vec<String>> {
        let event = abi
            .event(name)
            .ok_or_else(|| AbiError::NotFound(format!("event '{}'", name)))?;
        self.decode_event_log(event, topics, data)
    }

    /// Decode a log of `event`
    pub fn decode_event_log(
        &self,
        event: &EventDefinition,
        topics: &[H256],
        data: &[u8],
    ) -> AbiResult<Vec<String>> {
        let mut topics = topics.iter();
        if !event.is_anonymous() {
            match topics.next() {
                Some(topic) if *topic == event.topic() => {}
                Some(topic) => {
                    return Err(AbiError::TypeMismatch {
                        expected: event.topic().to_hex(),
                        got: topic.to_hex(),
                    })
                }
                None => {
                    return Err(AbiError::ArityMismatch {
                        expected: event.indexed_inputs().count() + 1,
                        got: 0,
                    })
                }
            }
        }

        let indexed = event.indexed_inputs().count();
        if topics.len() != indexed {
            return Err(AbiError::ArityMismatch {
                expected: indexed,
                got: topics.len(),
            });
        }

        let mut values = self
            .wrapper()
            .decode(&create_event_data_object(event), data)?
            .into_iter();

        event
            .inputs()
            .iter()
            .map(|param| {
                if !param.is_indexed() {
                    return values
                        .next()
                        .ok_or_else(|| AbiError::MissingValue(param.canonical_type()));
                }
                let topic = topics
                    .next()
                    .ok_or_else(|| AbiError::MissingValue(param.canonical_type()))?;
                self.render_topic(param, topic)
            })
            .collect()
    }

    fn render_topic(&self, param: &Param, topic: &H256) -> AbiResult<String> {
        let template = AbiObject::from_param(param);
        match &template {
            AbiObject::Value(_) if !template.is_dynamic() => {
                let decoded = Decoder::new(&self.config).decode(&template, topic.as_bytes())?;
                self.wrapper().render(&decoded)
            }
            _ => Ok(topic.to_hex()),
        }
    }

    /// Topic value of an indexed parameter, for building log filters.
    ///
    /// Static elementary types give their 32-byte encoding; `string` and
    /// `bytes` give the hash of their raw bytes.
    pub fn encode_topic(&self, ty: &str, text: &str) -> AbiResult<H256> {
        let param = Param::new("", ty)?;
        let leaf = match AbiObject::from_param(&param) {
            AbiObject::Value(leaf) => leaf,
            other => {
                return Err(AbiError::TypeMismatch {
                    expected: "elementary type".to_string(),
                    got: other.type_string(),
                })
            }
        };

        let value = leaf_from_text(leaf.value_type(), text)?;
        match value.value() {
            Some(Value::String(s)) => Ok(self.hasher.hash(s.as_bytes())),
            Some(Value::Bytes(b)) => Ok(self.hasher.hash(b)),
            _ => Ok(H256::from_slice(&encode(&value)?).map_err(PrimitiveError::from)?),
        }
    }
}

impl Default for AbiCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AbiCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbiCodec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn split_selector(calldata: &[u8]) -> AbiResult<(Selector, &[u8])> {
    if calldata.len() < Selector::LEN {
        return Err(AbiError::TruncatedInput {
            needed: Selector::LEN,
            available: calldata.len(),
        });
    }
    let (selector, args) = calldata.split_at(Selector::LEN);
    let selector = Selector::from_slice(selector).map_err(PrimitiveError::from)?;
    Ok((selector, args))
}
