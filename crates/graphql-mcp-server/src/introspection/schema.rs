//! Typed view of a GraphQL introspection result
//!
//! Type references are parsed into a closed [`TypeRef`] enum so that every consumer matches
//! exhaustively on the wrapper structure instead of probing loosely shaped JSON.

use serde::Deserialize;

/// The `__schema` object of an introspection response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: Option<NamedType>,
    #[serde(default)]
    pub mutation_type: Option<NamedType>,
    pub types: Vec<FullType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedType {
    pub name: String,
}

impl IntrospectionSchema {
    /// Look up a named type in the schema's type list
    pub fn get_type(&self, name: &str) -> Option<&FullType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn query_root(&self) -> Option<&FullType> {
        self.query_type
            .as_ref()
            .and_then(|root| self.get_type(&root.name))
    }

    pub fn mutation_root(&self) -> Option<&FullType> {
        self.mutation_type
            .as_ref()
            .and_then(|root| self.get_type(&root.name))
    }

    /// Fill in enum values for every enum leaf in a type reference
    pub fn resolve_enums(&self, type_ref: TypeRef) -> TypeRef {
        match type_ref {
            TypeRef::Enum { name, values } if values.is_empty() => {
                let values = self
                    .get_type(&name)
                    .map(FullType::enum_value_names)
                    .unwrap_or_default();
                TypeRef::Enum { name, values }
            }
            TypeRef::List(inner) => TypeRef::List(Box::new(self.resolve_enums(*inner))),
            TypeRef::NonNull(inner) => TypeRef::NonNull(Box::new(self.resolve_enums(*inner))),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// A named type with its fields and enum values
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
}

impl FullType {
    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or_default()
    }

    pub fn enum_value_names(&self) -> Vec<String> {
        self.enum_values
            .iter()
            .flatten()
            .map(|value| value.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumValue {
    pub name: String,
}

/// A reference to a GraphQL type, including its list and non-null wrappers
///
/// Enum values are not part of an introspection type reference, so a freshly parsed
/// [`TypeRef::Enum`] carries no values until [`IntrospectionSchema::resolve_enums`] fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTypeRef")]
pub enum TypeRef {
    Scalar(String),
    Object(String),
    Interface(String),
    Union(String),
    Enum { name: String, values: Vec<String> },
    InputObject(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// The name of the leaf type, with all wrappers removed
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Scalar(name)
            | TypeRef::Object(name)
            | TypeRef::Interface(name)
            | TypeRef::Union(name)
            | TypeRef::InputObject(name)
            | TypeRef::Enum { name, .. } => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

/// The `{kind, name, ofType}` shape as it appears on the wire
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypeRef {
    kind: TypeKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    of_type: Option<Box<RawTypeRef>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TypeRefError {
    #[error("{0:?} type reference has no ofType")]
    MissingOfType(TypeKind),

    #[error("{0:?} type reference has no name")]
    MissingName(TypeKind),
}

impl TryFrom<RawTypeRef> for TypeRef {
    type Error = TypeRefError;

    fn try_from(raw: RawTypeRef) -> Result<Self, Self::Error> {
        let wrapped = |of_type: Option<Box<RawTypeRef>>| {
            of_type
                .ok_or(TypeRefError::MissingOfType(raw.kind))
                .and_then(|inner| TypeRef::try_from(*inner))
                .map(Box::new)
        };
        let name = raw.name.ok_or(TypeRefError::MissingName(raw.kind));

        Ok(match raw.kind {
            TypeKind::List => TypeRef::List(wrapped(raw.of_type)?),
            TypeKind::NonNull => TypeRef::NonNull(wrapped(raw.of_type)?),
            TypeKind::Scalar => TypeRef::Scalar(name?),
            TypeKind::Object => TypeRef::Object(name?),
            TypeKind::Interface => TypeRef::Interface(name?),
            TypeKind::Union => TypeRef::Union(name?),
            TypeKind::InputObject => TypeRef::InputObject(name?),
            TypeKind::Enum => TypeRef::Enum {
                name: name?,
                values: Vec::new(),
            },
        })
    }
}
