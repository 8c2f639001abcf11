//! Argument resolution.
//!
//! Decodes the untyped argument map of an invocation against an
//! [`OperationDescriptor`]: every declared parameter is checked against its
//! [`ParamKind`], defaults are applied, and the result is assembled into a
//! typed [`ResolvedArguments`]. Resolution performs no I/O.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ResolveError;
use crate::registry::{
    OperationDescriptor, OperationKind, PARAM_COLLECTION, PARAM_PROPERTIES, PARAM_QUERY,
    PARAM_TARGET_PROPERTIES, ParamKind, ParameterSpec,
};

/// Typed arguments for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum ResolvedArguments {
    /// Arguments for `insert-one`.
    InsertOne {
        /// Target collection.
        collection: String,
        /// Object properties.
        properties: Map<String, Value>,
    },
    /// Arguments for `query`.
    Query {
        /// Target collection.
        collection: String,
        /// Hybrid search text.
        query_text: String,
        /// Fields to project, in request order.
        target_fields: Vec<String>,
    },
}

impl ResolvedArguments {
    /// The collection the operation targets.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::InsertOne { collection, .. } | Self::Query { collection, .. } => collection,
        }
    }
}

/// A parameter value that matched its declared kind.
#[derive(Debug, Clone)]
enum Decoded {
    Str(String),
    Object(Map<String, Value>),
    Strings(Vec<String>),
}

/// Checks one raw value against its parameter spec.
///
/// Returns `Ok(None)` when the value is absent, or present with the wrong
/// shape on an optional parameter. Array elements are checked even on
/// optional parameters.
fn decode(spec: &ParameterSpec, raw: Option<&Value>) -> Result<Option<Decoded>, ResolveError> {
    let missing = || {
        if spec.required {
            Err(ResolveError::MissingOrInvalidArgument {
                name: spec.name.to_string(),
            })
        } else {
            Ok(None)
        }
    };

    let value = match raw {
        None | Some(Value::Null) => return missing(),
        Some(v) => v,
    };

    match (spec.kind, value) {
        (ParamKind::String, Value::String(s)) => Ok(Some(Decoded::Str(s.clone()))),
        (ParamKind::Object, Value::Object(map)) => Ok(Some(Decoded::Object(map.clone()))),
        (ParamKind::Array, Value::Array(items)) => {
            let mut strings = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => strings.push(s.clone()),
                    _ => {
                        return Err(ResolveError::InvalidArgumentElement {
                            name: spec.name.to_string(),
                            index,
                        });
                    }
                }
            }
            Ok(Some(Decoded::Strings(strings)))
        }
        (kind, other) => {
            debug!(
                param = spec.name,
                expected = kind.as_str(),
                got = json_type(other),
                "argument has wrong shape"
            );
            missing()
        }
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decoded values keyed by parameter name.
struct DecodedArgs(HashMap<&'static str, Decoded>);

impl DecodedArgs {
    fn invalid(name: &str) -> ResolveError {
        ResolveError::MissingOrInvalidArgument {
            name: name.to_string(),
        }
    }

    fn string(&mut self, name: &'static str) -> Result<String, ResolveError> {
        match self.0.remove(name) {
            Some(Decoded::Str(s)) => Ok(s),
            _ => Err(Self::invalid(name)),
        }
    }

    fn object(&mut self, name: &'static str) -> Result<Map<String, Value>, ResolveError> {
        match self.0.remove(name) {
            Some(Decoded::Object(map)) => Ok(map),
            _ => Err(Self::invalid(name)),
        }
    }

    fn strings(&mut self, name: &'static str) -> Result<Vec<String>, ResolveError> {
        match self.0.remove(name) {
            Some(Decoded::Strings(items)) => Ok(items),
            _ => Err(Self::invalid(name)),
        }
    }

    fn collection(&mut self, default_collection: &str) -> String {
        match self.0.remove(PARAM_COLLECTION) {
            Some(Decoded::Str(s)) => s,
            _ => default_collection.to_string(),
        }
    }
}

/// Resolves raw invocation arguments against a descriptor.
///
/// `collection` falls back to `default_collection` when absent or not a
/// string. Keys that the descriptor does not declare are ignored.
///
/// # Errors
///
/// - [`ResolveError::MissingOrInvalidArgument`] when a required parameter is
///   absent, `null`, or of the wrong kind.
/// - [`ResolveError::InvalidArgumentElement`] when an array parameter holds a
///   non-string element.
pub fn resolve(
    descriptor: &OperationDescriptor,
    raw: &Map<String, Value>,
    default_collection: &str,
) -> Result<ResolvedArguments, ResolveError> {
    let mut decoded = HashMap::with_capacity(descriptor.parameters.len());
    for spec in &descriptor.parameters {
        if let Some(value) = decode(spec, raw.get(spec.name))? {
            decoded.insert(spec.name, value);
        }
    }
    let mut args = DecodedArgs(decoded);

    match descriptor.kind {
        OperationKind::InsertOne => Ok(ResolvedArguments::InsertOne {
            properties: args.object(PARAM_PROPERTIES)?,
            collection: args.collection(default_collection),
        }),
        OperationKind::Query => Ok(ResolvedArguments::Query {
            query_text: args.string(PARAM_QUERY)?,
            target_fields: args.strings(PARAM_TARGET_PROPERTIES)?,
            collection: args.collection(default_collection),
        }),
    }
}
