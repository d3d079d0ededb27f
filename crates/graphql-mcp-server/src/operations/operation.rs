use std::fmt;
use std::sync::Arc;

use rmcp::model::{Tool, ToolAnnotations};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    errors::ValidationError,
    graphql,
    introspection::{
        schema::{IntrospectionSchema, TypeRef},
        snapshot::SchemaSnapshot,
    },
};

use super::schema_walker;

/// The maximum number of leaf fields selected for an object-typed result
const MAX_SELECTED_FIELDS: usize = 5;

/// Fields guessed when a result type has no known leaf fields
const FALLBACK_SELECTION: [&str; 4] = ["id", "name", "code", "title"];

/// The root type an exposed field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    fn keyword(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An argument of an exposed root field
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDescriptor {
    pub name: String,
    pub type_ref: TypeRef,
    pub description: Option<String>,
}

/// A root Query or Mutation field exposed as a tool
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub field_name: String,
    pub operation_kind: OperationKind,
    pub return_type: TypeRef,
    pub args: Vec<ArgDescriptor>,
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// The name of the tool for this field, e.g. `query_countries`
    pub fn tool_name(&self) -> String {
        format!("{}_{}", self.operation_kind, self.field_name)
    }

    fn tool_description(&self) -> String {
        let signature = format!(
            "GraphQL {} field `{}` returning `{}`.",
            self.operation_kind,
            self.field_name,
            schema_walker::type_signature(&self.return_type)
        );
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => format!("{description}\n\n{signature}"),
            _ => signature,
        }
    }

    /// The JSON schema of the tool input: one property per argument, with non-null arguments
    /// required
    pub fn parameter_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .args
            .iter()
            .map(|arg| {
                (
                    arg.name.clone(),
                    Value::from(schema_walker::type_to_schema(
                        &arg.type_ref,
                        arg.description.as_deref(),
                    )),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|arg| arg.type_ref.is_non_null())
            .map(|arg| arg.name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }
}

/// Build the executable document for a field, e.g.
/// `query ($code: ID!) { country(code: $code) { code name } }`
pub fn synthesize_document(descriptor: &FieldDescriptor, schema: &IntrospectionSchema) -> String {
    let keyword = descriptor.operation_kind.keyword();
    let mut field = descriptor.field_name.clone();

    if !descriptor.args.is_empty() {
        let arguments = descriptor
            .args
            .iter()
            .map(|arg| format!("{name}: ${name}", name = arg.name))
            .collect::<Vec<_>>()
            .join(", ");
        field.push_str(&format!("({arguments})"));
    }

    if let Some(selection) = selection_set(&descriptor.return_type, schema) {
        field.push(' ');
        field.push_str(&selection);
    }

    if descriptor.args.is_empty() {
        format!("{keyword} {{ {field} }}")
    } else {
        let variables = descriptor
            .args
            .iter()
            .map(|arg| {
                format!(
                    "${}: {}",
                    arg.name,
                    schema_walker::type_signature(&arg.type_ref)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{keyword} ({variables}) {{ {field} }}")
    }
}

/// Pick a best-effort selection set for a return type. Leaf types need none.
fn selection_set(return_type: &TypeRef, schema: &IntrospectionSchema) -> Option<String> {
    match schema_walker::unwrap(return_type) {
        TypeRef::Scalar(_) | TypeRef::Enum { .. } => None,
        TypeRef::Object(name)
        | TypeRef::Interface(name)
        | TypeRef::Union(name)
        | TypeRef::InputObject(name) => {
            let mut fields: Vec<&str> = schema
                .get_type(name)
                .map(|full_type| {
                    full_type
                        .fields()
                        .iter()
                        .filter(|field| {
                            matches!(
                                schema_walker::unwrap(&field.type_ref),
                                TypeRef::Scalar(_) | TypeRef::Enum { .. }
                            )
                        })
                        .take(MAX_SELECTED_FIELDS)
                        .map(|field| field.name.as_str())
                        .collect()
                })
                .unwrap_or_default();
            if fields.is_empty() {
                fields = FALLBACK_SELECTION.to_vec();
            }
            Some(format!("{{ {} }}", fields.join(" ")))
        }
        TypeRef::List(_) | TypeRef::NonNull(_) => None,
    }
}

/// A root field exposed as an MCP tool
#[derive(Debug, Clone)]
pub struct Operation {
    tool: Tool,
    descriptor: FieldDescriptor,
    snapshot: Arc<SchemaSnapshot>,
}

impl AsRef<Tool> for Operation {
    fn as_ref(&self) -> &Tool {
        &self.tool
    }
}

impl Operation {
    pub fn new(descriptor: FieldDescriptor, snapshot: Arc<SchemaSnapshot>) -> Self {
        let tool = Tool::new(
            descriptor.tool_name(),
            descriptor.tool_description(),
            descriptor.parameter_schema(),
        )
        .annotate(
            ToolAnnotations::new().read_only(descriptor.operation_kind == OperationKind::Query),
        );

        Self {
            tool,
            descriptor,
            snapshot,
        }
    }

    pub fn name(&self) -> &str {
        &self.tool.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Synthesize the document to send for this field
    pub fn document(&self) -> String {
        synthesize_document(&self.descriptor, self.snapshot.schema())
    }

    /// Check the tool input against the tool's parameter schema
    fn validate_arguments(&self, arguments: &Value) -> Result<(), ValidationError> {
        let schema = Value::Object(self.tool.input_schema.as_ref().clone());
        let validator = jsonschema::validator_for(&schema)
            .map_err(|error| ValidationError::Input(error.to_string()))?;
        let errors: Vec<String> = validator
            .iter_errors(arguments)
            .map(|error| error.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Arguments(errors))
        }
    }
}

impl graphql::Executable for Operation {
    fn operation(&self, _input: &Value) -> Result<String, ValidationError> {
        Ok(self.document())
    }

    fn variables(&self, input: &Value) -> Result<Value, ValidationError> {
        // Absent and null arguments are equivalent
        let arguments: Map<String, Value> = match input {
            Value::Null => Map::new(),
            Value::Object(arguments) => arguments
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => {
                return Err(ValidationError::Input(
                    "tool arguments must be a JSON object".to_string(),
                ));
            }
        };
        let arguments = Value::Object(arguments);
        self.validate_arguments(&arguments)?;

        let variables: Map<String, Value> = self
            .descriptor
            .args
            .iter()
            .filter_map(|arg| {
                arguments
                    .get(&arg.name)
                    .map(|value| (arg.name.clone(), decode_input_objects(&arg.type_ref, value.clone())))
            })
            .collect();

        if let Value::Object(provided) = &arguments {
            for name in provided.keys() {
                if !variables.contains_key(name) {
                    debug!("Ignoring undeclared argument `{name}` for {}", self.tool.name);
                }
            }
        }

        Ok(Value::Object(variables))
    }
}

/// Input objects arrive as JSON-encoded strings; send them as the decoded object
fn decode_input_objects(type_ref: &TypeRef, value: Value) -> Value {
    match (type_ref, value) {
        (TypeRef::NonNull(inner), value) => decode_input_objects(inner, value),
        (TypeRef::List(inner), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| decode_input_objects(inner, item))
                .collect(),
        ),
        (TypeRef::InputObject(_), Value::String(text)) => serde_json::from_str::<Value>(&text)
            .ok()
            .filter(Value::is_object)
            .unwrap_or(Value::String(text)),
        (_, value) => value,
    }
}
