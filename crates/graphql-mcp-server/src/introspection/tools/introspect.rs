use crate::errors::{ErrorKind, McpError};
use crate::graphql::CallResult;
use crate::introspection::fetch_schema;
use crate::schema_from_type;
use crate::session::Session;
use rmcp::model::{CallToolResult, Content, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

/// The name of the tool to get the GraphQL schema of the configured endpoint
pub const INTROSPECT_TOOL_NAME: &str = "introspect";

/// A tool to get the full introspection result of the configured endpoint.
#[derive(Clone)]
pub struct Introspect {
    pub tool: Tool,
}

/// Input for the introspect tool.
#[derive(JsonSchema, Deserialize, Default)]
pub struct Input {
    /// Include deprecated fields, arguments and enum values. Defaults to false.
    #[serde(default, alias = "includeDeprecated")]
    include_deprecated: bool,
}

impl Introspect {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                INTROSPECT_TOOL_NAME,
                "Get the GraphQL schema of the configured endpoint as an introspection result. Use it to write operations for the `execute` tool.",
                schema_from_type!(Input),
            ),
        }
    }

    /// Return the cached schema when it was fetched with the same deprecation setting, otherwise
    /// fetch it again. A fresh fetch never replaces the tool catalog.
    pub async fn execute(&self, session: &Session, input: Input) -> Result<CallToolResult, McpError> {
        if let Some(snapshot) = session.catalog.snapshot()
            && snapshot.include_deprecated() == input.include_deprecated
        {
            return schema_result(snapshot.raw());
        }

        match fetch_schema(
            &session.client,
            session.config.endpoint(),
            input.include_deprecated,
        )
        .await
        {
            Ok(snapshot) => schema_result(snapshot.raw()),
            Err(error) => {
                warn!("Introspection failed: {error}");
                Ok(CallResult::failure(ErrorKind::Introspection, error, None).into_tool_result())
            }
        }
    }
}

impl Default for Introspect {
    fn default() -> Self {
        Self::new()
    }
}

fn schema_result(schema: &serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(match serde_json::to_string_pretty(schema) {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(error) => CallResult::failure(
            ErrorKind::Internal,
            format!("Failed to serialize the schema: {error}"),
            None,
        )
        .into_tool_result(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::snapshot::SchemaSnapshot;
    use crate::operations::Catalog;
    use crate::operations::test_support::countries_snapshot;
    use crate::session::{Overrides, SessionConfig, SessionDefaults};
    use serde_json::{Value, json};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn session(endpoint: &str, snapshot: Option<SchemaSnapshot>) -> Session {
        let config = SessionConfig::resolve(
            &SessionDefaults::default(),
            Overrides {
                endpoint: Some(endpoint.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let client = config.client().unwrap();
        Session {
            config,
            client,
            catalog: snapshot
                .map(|snapshot| Catalog::rebuild(Arc::new(snapshot), &BTreeSet::new()))
                .unwrap_or_default(),
            introspection_error: None,
        }
    }

    fn text(result: &CallToolResult) -> String {
        result.content.first().unwrap().as_text().unwrap().text.clone()
    }

    #[tokio::test]
    async fn cached_schema_is_returned_without_a_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .expect(0)
            .create_async()
            .await;
        let snapshot = countries_snapshot();
        let expected = snapshot.raw().clone();
        let session = session(&server.url(), Some(snapshot));

        let result = Introspect::new()
            .execute(&session, Input::default())
            .await
            .unwrap();

        mock.assert();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(serde_json::from_str::<Value>(&text(&result)).unwrap(), expected);
    }

    #[tokio::test]
    async fn different_deprecation_setting_fetches_again() {
        let mut server = mockito::Server::new_async().await;
        let schema = json!({
            "queryType": { "name": "Query" },
            "mutationType": null,
            "subscriptionType": null,
            "types": []
        });
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({
                "variables": { "includeDeprecated": true }
            })))
            .with_body(json!({ "data": { "__schema": schema } }).to_string())
            .expect(1)
            .create_async()
            .await;
        let session = session(&server.url(), Some(countries_snapshot()));

        let result = Introspect::new()
            .execute(
                &session,
                Input {
                    include_deprecated: true,
                },
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(serde_json::from_str::<Value>(&text(&result)).unwrap(), schema);
        assert_eq!(session.catalog.len(), 8);
    }

    #[tokio::test]
    async fn failed_fetch_is_an_error_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;
        let session = session(&server.url(), None);

        let result = Introspect::new()
            .execute(&session, Input::default())
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(
            body,
            json!({
                "status": "failure",
                "kind": "introspection",
                "message": "Introspection query failed with HTTP 503 Service Unavailable"
            })
        );
    }

    #[test]
    fn input_accepts_camel_case() {
        let input: Input = serde_json::from_value(json!({ "includeDeprecated": true })).unwrap();
        assert!(input.include_deprecated);
    }
}
