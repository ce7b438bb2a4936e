//! Template construction from definitions

use crate::abi::object::{AbiObject, Field, ListObject, ListType, Leaf, StructObject, ValueType};
use crate::contract::{EventDefinition, FunctionDefinition, Param};
use crate::type_descriptor::BaseType;

impl AbiObject {
    /// Template for a single parameter: correct shape, unset leaves.
    ///
    /// List arity comes from the outermost dimension; the element template is
    /// built from the parameter with that dimension stripped.
    pub fn from_param(param: &Param) -> AbiObject {
        let ty = param.type_descriptor();
        if let (Some(dimension), Some(element)) = (ty.last_dimension(), param.element()) {
            let list_type = match dimension {
                0 => ListType::Dynamic,
                len => ListType::Static(len),
            };
            return AbiObject::List(ListObject::new(list_type, AbiObject::from_param(&element)));
        }

        match ValueType::from_base(ty.base_type()) {
            Some(value_type) => AbiObject::Value(Leaf::new(value_type)),
            None => {
                debug_assert_eq!(ty.base_type(), BaseType::Tuple);
                let name = param.struct_name().unwrap_or_default();
                AbiObject::Struct(StructObject::new(name, fields_from_params(param.components())))
            }
        }
    }
}

fn fields_from_params<'a>(params: impl IntoIterator<Item = &'a Param>) -> Vec<Field> {
    params
        .into_iter()
        .map(|p| Field {
            name: p.name().to_string(),
            value: AbiObject::from_param(p),
        })
        .collect()
}

/// Top-level struct mirroring an ordered parameter list
pub fn create_object<'a>(name: &str, params: impl IntoIterator<Item = &'a Param>) -> AbiObject {
    AbiObject::Struct(StructObject::new(name, fields_from_params(params)))
}

/// Template for a function's (or constructor's) inputs
pub fn create_input_object(function: &FunctionDefinition) -> AbiObject {
    create_object(function.name(), function.inputs())
}

/// Template for a function's outputs
pub fn create_output_object(function: &FunctionDefinition) -> AbiObject {
    create_object(function.name(), function.outputs())
}

/// Template for the log data of an event: its non-indexed parameters
pub fn create_event_data_object(event: &EventDefinition) -> AbiObject {
    create_object(event.name(), event.non_indexed_inputs())
}
