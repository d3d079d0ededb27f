//! Fetch the schema of a GraphQL endpoint, and the tools that expose it to an AI agent.

pub mod schema;
pub mod snapshot;
pub(crate) mod tools;

use crate::errors::IntrospectionError;
use serde_json::{Value, json};
use snapshot::SchemaSnapshot;
use tracing::debug;
use url::Url;

/// The standard introspection query, with deprecated members controlled by a variable
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery($includeDeprecated: Boolean!) {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: $includeDeprecated) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: $includeDeprecated) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Run the introspection query against an endpoint
pub(crate) async fn fetch_schema(
    client: &reqwest::Client,
    endpoint: &Url,
    include_deprecated: bool,
) -> Result<SchemaSnapshot, IntrospectionError> {
    let response = client
        .post(endpoint.clone())
        .json(&json!({
            "query": INTROSPECTION_QUERY,
            "variables": { "includeDeprecated": include_deprecated },
            "operationName": "IntrospectionQuery",
        }))
        .send()
        .await
        .map_err(IntrospectionError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(IntrospectionError::Status(status));
    }

    let body = response
        .json::<Value>()
        .await
        .map_err(IntrospectionError::Body)?;

    if let Some(errors) = body.get("errors").filter(|errors| !errors.is_null())
        && body.pointer("/data/__schema").is_none_or(Value::is_null)
    {
        return Err(IntrospectionError::GraphQL(errors.to_string()));
    }

    let snapshot = SchemaSnapshot::from_response(body, include_deprecated)?;
    debug!(
        types = snapshot.schema().types.len(),
        include_deprecated, "Received schema from {endpoint}"
    );
    Ok(snapshot)
}
