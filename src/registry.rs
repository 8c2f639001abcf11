//! Operation registry.
//!
//! Declares the invocable operations and their parameter schemas,
//! independent of any transport. The set is fixed at startup and only
//! read afterwards, so a registry can be shared freely across concurrent
//! invocations.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::RegistryError;

/// Wire name of the single-object insert operation.
pub const INSERT_ONE: &str = "insert-one";
/// Wire name of the hybrid query operation.
pub const QUERY: &str = "query";

/// Wire name of the optional target collection parameter.
pub const PARAM_COLLECTION: &str = "collection";
/// Wire name of the object properties parameter.
pub const PARAM_PROPERTIES: &str = "properties";
/// Wire name of the query text parameter.
pub const PARAM_QUERY: &str = "query";
/// Wire name of the projected fields parameter.
pub const PARAM_TARGET_PROPERTIES: &str = "targetProperties";

/// Shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// A JSON string.
    String,
    /// A JSON object with string keys.
    Object,
    /// A JSON array whose elements must all be strings.
    Array,
}

impl ParamKind {
    /// JSON Schema `type` keyword for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Which store operation a descriptor drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Insert one object through the batch path.
    InsertOne,
    /// Hybrid search with field projection.
    Query,
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    /// Wire name in the argument map.
    pub name: &'static str,
    /// Expected value shape.
    pub kind: ParamKind,
    /// Whether absence is an error.
    pub required: bool,
    /// Human-readable description.
    pub description: &'static str,
}

impl ParameterSpec {
    /// A required parameter.
    #[must_use]
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    /// An optional parameter.
    #[must_use]
    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// An invocable operation: its name, purpose and ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// Unique wire name.
    pub name: &'static str,
    /// What the operation does.
    pub description: &'static str,
    /// Store operation it maps to.
    pub kind: OperationKind,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterSpec>,
}

impl OperationDescriptor {
    /// Looks up a parameter by wire name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Renders the parameters as a JSON Schema object for MCP `tools/list`.
    #[must_use]
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if param.kind == ParamKind::Array {
                prop["items"] = json!({ "type": "string" });
            }
            properties.insert(param.name.to_string(), prop);
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        schema
    }
}

/// Descriptor for `insert-one`.
#[must_use]
pub fn insert_one_descriptor() -> OperationDescriptor {
    OperationDescriptor {
        name: INSERT_ONE,
        description: "Insert one object into a Weaviate collection. Returns the \
                      store-assigned object ID.",
        kind: OperationKind::InsertOne,
        parameters: vec![
            ParameterSpec::optional(
                PARAM_COLLECTION,
                ParamKind::String,
                "Name of the target collection",
            ),
            ParameterSpec::required(
                PARAM_PROPERTIES,
                ParamKind::Object,
                "Object properties to insert",
            ),
        ],
    }
}

/// Descriptor for `query`.
#[must_use]
pub fn query_descriptor() -> OperationDescriptor {
    OperationDescriptor {
        name: QUERY,
        description: "Run a hybrid (keyword + vector) search against a Weaviate \
                      collection and return the requested properties as JSON.",
        kind: OperationKind::Query,
        parameters: vec![
            ParameterSpec::optional(
                PARAM_COLLECTION,
                ParamKind::String,
                "Name of the target collection",
            ),
            ParameterSpec::required(PARAM_QUERY, ParamKind::String, "Query data within Weaviate"),
            ParameterSpec::required(
                PARAM_TARGET_PROPERTIES,
                ParamKind::Array,
                "Properties to return with the query",
            ),
        ],
    }
}

/// The set of invocable operations.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    descriptors: Vec<OperationDescriptor>,
}

impl OperationRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry served by this crate: `insert-one` and `query`.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            descriptors: vec![insert_one_descriptor(), query_descriptor()],
        }
    }

    /// Adds a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is taken.
    pub fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), RegistryError> {
        if self.descriptors.iter().any(|d| d.name == descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name.to_string()));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Finds a descriptor by wire name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown names.
    pub fn lookup(&self, name: &str) -> Result<&OperationDescriptor, RegistryError> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = OperationRegistry::standard();
        assert_eq!(registry.len(), 2);
        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec![INSERT_ONE, QUERY]);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = OperationRegistry::standard();
        assert_eq!(
            registry.lookup("delete-all"),
            Err(RegistryError::NotFound("delete-all".to_string()))
        );
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = OperationRegistry::new();
        assert!(registry.register(query_descriptor()).is_ok());
        assert_eq!(
            registry.register(query_descriptor()),
            Err(RegistryError::Duplicate(QUERY.to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_query_parameters() {
        let registry = OperationRegistry::standard();
        let query = registry.lookup(QUERY).unwrap_or_else(|_| unreachable!());
        assert_eq!(query.kind, OperationKind::Query);

        let collection = query.parameter(PARAM_COLLECTION);
        assert!(collection.is_some_and(|p| !p.required && p.kind == ParamKind::String));

        let targets = query.parameter(PARAM_TARGET_PROPERTIES);
        assert!(targets.is_some_and(|p| p.required && p.kind == ParamKind::Array));
    }

    #[test]
    fn test_input_schema() {
        let schema = insert_one_descriptor().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["properties"]["type"], "object");
        assert_eq!(schema["required"], json!(["properties"]));

        let schema = query_descriptor().input_schema();
        assert_eq!(
            schema["properties"]["targetProperties"]["items"]["type"],
            "string"
        );
        assert_eq!(schema["required"], json!(["query", "targetProperties"]));
    }
}
