use crate::errors::ValidationError;
use crate::graphql;
use crate::schema_from_type;
use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// The name of the tool to execute an ad hoc GraphQL operation
pub const EXECUTE_TOOL_NAME: &str = "execute";

#[derive(Clone)]
pub struct Execute {
    pub tool: Tool,
}

/// Input for the execute tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The GraphQL operation
    query: String,

    /// The variable values represented as JSON
    #[schemars(schema_with = "String::json_schema", default)]
    variables: Option<Value>,
}

impl Execute {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                EXECUTE_TOOL_NAME,
                "Execute a GraphQL operation against the configured endpoint. Use the `introspect` tool to get information about the GraphQL schema. Always use the schema to create operations - do not try arbitrary operations. The operation is checked against the depth, complexity and disabled resolver limits of the session before it is sent.",
                schema_from_type!(Input),
            ),
        }
    }
}

impl Default for Execute {
    fn default() -> Self {
        Self::new()
    }
}

fn input(value: &Value) -> Result<Input, ValidationError> {
    serde_json::from_value::<Input>(value.clone())
        .map_err(|e| ValidationError::Input(e.to_string()))
}

impl graphql::Executable for Execute {
    fn operation(&self, input: &Value) -> Result<String, ValidationError> {
        let input = self::input(input)?;
        if input.query.trim().is_empty() {
            return Err(ValidationError::Input("query must not be empty".into()));
        }
        Ok(input.query)
    }

    fn variables(&self, input: &Value) -> Result<Value, ValidationError> {
        match self::input(input)?.variables {
            None => Ok(Value::Null),
            Some(Value::Null) => Ok(Value::Null),
            Some(Value::String(s)) => serde_json::from_str(&s)
                .map_err(|e| ValidationError::Input(format!("Invalid variables: {e}"))),
            Some(obj) if obj.is_object() => Ok(obj),
            _ => Err(ValidationError::Input(
                "Variables must be a JSON object or string".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ErrorKind, ValidationError};
    use crate::graphql::{CallResult, Executable, Request};
    use crate::introspection::tools::execute::Execute;
    use crate::session::{Overrides, SessionConfig, SessionDefaults};
    use serde_json::{Value, json};

    #[test]
    fn execute_query_with_variables_as_string() {
        let execute = Execute::new();

        let query = "query GetCountry($code: ID!) { country(code: $code) { code name } }";
        let variables = json!({ "code": "FR" });

        let input = json!({
            "query": query,
            "variables": variables.to_string()
        });

        assert_eq!(Executable::operation(&execute, &input), Ok(query.to_string()));
        assert_eq!(Executable::variables(&execute, &input), Ok(variables));
    }

    #[test]
    fn execute_query_with_variables_as_json() {
        let execute = Execute::new();

        let query = "query GetCountry($code: ID!) { country(code: $code) { code name } }";
        let variables = json!({ "code": "FR" });

        let input = json!({
            "query": query,
            "variables": variables
        });

        assert_eq!(Executable::operation(&execute, &input), Ok(query.to_string()));
        assert_eq!(Executable::variables(&execute, &input), Ok(variables));
    }

    #[test]
    fn execute_query_without_variables() {
        let execute = Execute::new();

        let query = "{ countries { code name } }";
        let input = json!({
            "query": query,
        });

        assert_eq!(Executable::operation(&execute, &input), Ok(query.to_string()));
        assert_eq!(Executable::variables(&execute, &input), Ok(Value::Null));
    }

    #[test]
    fn execute_query_invalid_input() {
        let execute = Execute::new();

        let input = json!({
            "nonsense": "test",
        });

        let result = Executable::operation(&execute, &input);
        assert!(matches!(result, Err(ValidationError::Input(_))));
    }

    #[test]
    fn execute_query_empty_query() {
        let execute = Execute::new();

        let result = Executable::operation(&execute, &json!({ "query": "  " }));
        assert_eq!(
            result,
            Err(ValidationError::Input("query must not be empty".to_string()))
        );
    }

    #[test]
    fn execute_query_invalid_variables() {
        let execute = Execute::new();

        let input = json!({
            "query": "query GetCountry($code: ID!) { country(code: $code) { code name } }",
            "variables": "garbage",
        });

        let result = Executable::variables(&execute, &input);
        assert!(
            matches!(result, Err(ValidationError::Input(msg)) if msg.starts_with("Invalid variables"))
        );
    }

    #[test]
    fn execute_query_variables_of_wrong_type() {
        let execute = Execute::new();

        let input = json!({
            "query": "{ ping }",
            "variables": [1, 2],
        });

        assert_eq!(
            Executable::variables(&execute, &input),
            Err(ValidationError::Input(
                "Variables must be a JSON object or string".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn disabled_resolver_is_rejected_without_a_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .expect(0)
            .create_async()
            .await;
        let session = SessionConfig::resolve(
            &SessionDefaults::default(),
            Overrides {
                endpoint: Some(server.url()),
                disabled_resolvers: Some(vec!["country".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
        let client = session.client().unwrap();
        let query = "query { country(code: \"FR\") { name } }";

        let result = Execute::new()
            .execute(Request {
                input: json!({ "query": query }),
                session: &session,
                client: &client,
            })
            .await;

        mock.assert();
        assert_eq!(
            result,
            CallResult::Failure {
                kind: ErrorKind::Validation,
                message: "Query references the disabled resolver `country`".to_string(),
                query: Some(query.to_string()),
                response: None,
            }
        );
    }
}
