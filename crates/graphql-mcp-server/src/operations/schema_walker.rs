//! JSON Schema and GraphQL syntax for introspected type references
//!
//! The functions in this module walk a [`TypeRef`] recursively. Introspection type references
//! are bounded in depth by the introspection query, so the recursion is bounded as well.

use schemars::{Schema, json_schema};

use crate::introspection::schema::TypeRef;

/// A wrapper applied around a leaf type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    List,
    NonNull,
}

/// Strip all list and non-null wrappers from a type reference
pub fn unwrap(type_ref: &TypeRef) -> &TypeRef {
    match type_ref {
        TypeRef::List(inner) | TypeRef::NonNull(inner) => unwrap(inner),
        leaf => leaf,
    }
}

/// Convert a GraphQL type reference into a JSON Schema.
///
/// Non-null wrappers map to their inner schema; whether the value is required is decided by the
/// caller. Object-like types have no meaningful tool input representation and are exposed as
/// strings. Input objects are expected as JSON-encoded strings.
pub fn type_to_schema(type_ref: &TypeRef, description: Option<&str>) -> Schema {
    let schema = match type_ref {
        TypeRef::NonNull(inner) => type_to_schema(inner, None),
        TypeRef::List(inner) => json_schema!({
            "type": "array",
            "items": type_to_schema(inner, None),
        }),
        TypeRef::Scalar(name) => match name.as_str() {
            "Int" => json_schema!({"type": "integer"}),
            "Float" => json_schema!({"type": "number"}),
            "Boolean" => json_schema!({"type": "boolean"}),
            _ => json_schema!({"type": "string"}),
        },
        TypeRef::Enum { values, .. } if values.is_empty() => json_schema!({"type": "string"}),
        TypeRef::Enum { values, .. } => json_schema!({
            "type": "string",
            "enum": values,
        }),
        TypeRef::InputObject(name) => with_desc(
            json_schema!({"type": "string"}),
            Some(&format!("JSON-encoded {name} input object")),
        ),
        TypeRef::Object(_) | TypeRef::Interface(_) | TypeRef::Union(_) => {
            json_schema!({"type": "string"})
        }
    };

    match description {
        Some(description) => with_desc(schema, Some(description)),
        None => schema,
    }
}

/// Render a type reference in GraphQL syntax, e.g. `[String!]!`
pub fn type_signature(type_ref: &TypeRef) -> String {
    match type_ref {
        TypeRef::NonNull(inner) => format!("{}!", type_signature(inner)),
        TypeRef::List(inner) => format!("[{}]", type_signature(inner)),
        leaf => leaf.name().to_string(),
    }
}

/// Split a type reference into its wrappers, outermost first, and its leaf
pub fn wrappers(type_ref: &TypeRef) -> (Vec<Wrapper>, &TypeRef) {
    let mut wrappers = Vec::new();
    let mut current = type_ref;
    loop {
        match current {
            TypeRef::List(inner) => {
                wrappers.push(Wrapper::List);
                current = inner;
            }
            TypeRef::NonNull(inner) => {
                wrappers.push(Wrapper::NonNull);
                current = inner;
            }
            leaf => return (wrappers, leaf),
        }
    }
}

/// Apply wrappers, outermost first, around a leaf type
pub fn rewrap(leaf: TypeRef, wrappers: &[Wrapper]) -> TypeRef {
    wrappers
        .iter()
        .rev()
        .fold(leaf, |inner, wrapper| match wrapper {
            Wrapper::List => TypeRef::List(Box::new(inner)),
            Wrapper::NonNull => TypeRef::NonNull(Box::new(inner)),
        })
}

/// Modifies a schema to include an optional description, ahead of any description it already has
fn with_desc(mut schema: Schema, description: Option<&str>) -> Schema {
    if let Some(desc) = description {
        let object = schema.ensure_object();
        let combined = match object.get("description").and_then(|existing| existing.as_str()) {
            Some(existing) => format!("{desc}\n\n{existing}"),
            None => desc.to_string(),
        };
        object.insert("description".to_string(), combined.into());
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn scalar(name: &str) -> TypeRef {
        TypeRef::Scalar(name.to_string())
    }

    fn non_null(inner: TypeRef) -> TypeRef {
        TypeRef::NonNull(Box::new(inner))
    }

    fn list(inner: TypeRef) -> TypeRef {
        TypeRef::List(Box::new(inner))
    }

    #[rstest]
    #[case(scalar("String"), "String")]
    #[case(non_null(scalar("ID")), "ID!")]
    #[case(list(scalar("Int")), "[Int]")]
    #[case(non_null(list(non_null(scalar("String")))), "[String!]!")]
    #[case(list(list(non_null(TypeRef::Object("Country".to_string())))), "[[Country!]]")]
    fn renders_type_signatures(#[case] type_ref: TypeRef, #[case] expected: &str) {
        assert_eq!(type_signature(&type_ref), expected);
    }

    #[rstest]
    #[case(scalar("String"))]
    #[case(non_null(scalar("ID")))]
    #[case(non_null(list(non_null(TypeRef::InputObject("Filter".to_string())))))]
    #[case(list(non_null(list(TypeRef::Enum { name: "Sort".to_string(), values: vec![] }))))]
    fn wrappers_round_trip(#[case] type_ref: TypeRef) {
        let (chain, leaf) = wrappers(&type_ref);
        let rebuilt = rewrap(leaf.clone(), &chain);

        assert_eq!(rebuilt, type_ref);
        assert_eq!(type_signature(&rebuilt), type_signature(&type_ref));
        assert_eq!(unwrap(&type_ref), leaf);
    }

    #[rstest]
    #[case(scalar("String"), "string")]
    #[case(scalar("ID"), "string")]
    #[case(scalar("Int"), "integer")]
    #[case(scalar("Float"), "number")]
    #[case(scalar("Boolean"), "boolean")]
    #[case(scalar("DateTime"), "string")]
    #[case(non_null(scalar("Int")), "integer")]
    #[case(TypeRef::Object("Country".to_string()), "string")]
    #[case(TypeRef::Union("SearchResult".to_string()), "string")]
    #[case(list(scalar("Int")), "array")]
    fn maps_json_types(#[case] type_ref: TypeRef, #[case] expected: &str) {
        let schema = type_to_schema(&type_ref, None);
        assert_eq!(
            schema.get("type").and_then(|t| t.as_str()),
            Some(expected)
        );
    }

    #[test]
    fn enum_schema_lists_values() {
        let schema = type_to_schema(
            &non_null(list(TypeRef::Enum {
                name: "SortOrder".to_string(),
                values: vec!["ASC".to_string(), "DESC".to_string()],
            })),
            Some("Sort direction"),
        );

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "array",
                "items": { "type": "string", "enum": ["ASC", "DESC"] },
                "description": "Sort direction"
            })
        );
    }

    #[test]
    fn input_object_schema_keeps_description_and_encoding_hint() {
        let schema = type_to_schema(
            &TypeRef::NonNull(Box::new(TypeRef::InputObject(
                "CountryFilterInput".to_string(),
            ))),
            Some("Filter countries"),
        );

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "string",
                "description": "Filter countries\n\nJSON-encoded CountryFilterInput input object"
            })
        );
    }

    #[test]
    fn input_object_schema_without_description_has_the_encoding_hint() {
        let schema = type_to_schema(&TypeRef::InputObject("CountryFilterInput".to_string()), None);

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "string",
                "description": "JSON-encoded CountryFilterInput input object"
            })
        );
    }
}
