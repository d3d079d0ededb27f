//! Execute GraphQL operations from an MCP tool

use std::fmt::Display;

use reqwest::StatusCode;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::errors::{ConnectivityError, ErrorKind, ExecutionError, ValidationError};
use crate::safety;
use crate::session::SessionConfig;

/// The probe sent to check that an endpoint speaks GraphQL
const PROBE_QUERY: &str = "{ __typename }";

pub struct Request<'a> {
    pub input: Value,
    pub session: &'a SessionConfig,
    pub client: &'a reqwest::Client,
}

/// The outcome of a tool call that executes an operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallResult {
    Success {
        query: String,
        response: Value,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<Value>,
    },
}

impl CallResult {
    pub fn failure(kind: ErrorKind, error: impl Display, query: Option<String>) -> Self {
        CallResult::Failure {
            kind,
            message: error.to_string(),
            query,
            response: None,
        }
    }

    fn with_response(self, body: Value) -> Self {
        match self {
            CallResult::Failure {
                kind,
                message,
                query,
                ..
            } => CallResult::Failure {
                kind,
                message,
                query,
                response: Some(body),
            },
            success => success,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CallResult::Failure { .. })
    }

    /// Convert into an MCP tool result. Failures are flagged with `is_error`.
    pub fn into_tool_result(self) -> CallToolResult {
        match Content::json(&self) {
            Ok(content) if self.is_failure() => CallToolResult::error(vec![content]),
            Ok(content) => CallToolResult::success(vec![content]),
            Err(error) => {
                warn!("Could not serialize a tool result: {}", error.message);
                CallToolResult::error(vec![Content::text(
                    json!({
                        "status": "failure",
                        "kind": ErrorKind::Internal,
                        "message": format!("Could not serialize the result: {}", error.message),
                    })
                    .to_string(),
                )])
            }
        }
    }
}

/// Able to be executed as a GraphQL operation
pub trait Executable {
    /// Get the operation to execute
    fn operation(&self, input: &Value) -> Result<String, ValidationError>;

    /// Get the variables to execute the operation with
    fn variables(&self, input: &Value) -> Result<Value, ValidationError>;

    /// Check the operation against the session limits, then execute it
    async fn execute(&self, request: Request<'_>) -> CallResult {
        let query = match self.operation(&request.input) {
            Ok(query) => query,
            Err(error) => return CallResult::failure(ErrorKind::Validation, error, None),
        };

        if let Err(error) = safety::validate(&query, request.session.limits()) {
            return CallResult::failure(ErrorKind::Validation, error, Some(query));
        }

        let variables = match self.variables(&request.input) {
            Ok(variables) => variables,
            Err(error) => {
                warn!("Rejected tool input: {error}");
                return CallResult::failure(ErrorKind::Validation, error, Some(query));
            }
        };

        debug!("Executing operation:\n{query}");
        send(&request, query, variables).await
    }
}

async fn send(request: &Request<'_>, query: String, variables: Value) -> CallResult {
    let timeout_ms = request.session.timeout_ms();
    let execution_failure = |error: ExecutionError, query: String| {
        warn!("Operation failed: {error}");
        CallResult::failure(ErrorKind::Execution, error, Some(query))
    };
    let transport_failure = |error: reqwest::Error| {
        if error.is_timeout() {
            ExecutionError::Timeout(timeout_ms)
        } else {
            ExecutionError::Transport(error)
        }
    };

    let response = match request
        .client
        .post(request.session.endpoint().clone())
        .json(&json!({
            "query": query,
            "variables": variables,
        }))
        .send()
        .await
    {
        Ok(response) => response,
        Err(error) => return execution_failure(transport_failure(error), query),
    };

    let status = response.status();
    let body = match response.json::<Value>().await {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return execution_failure(ExecutionError::Status(status), query);
        }
        Err(error) if error.is_timeout() => {
            return execution_failure(ExecutionError::Timeout(timeout_ms), query);
        }
        Err(error) => return execution_failure(ExecutionError::Body(error), query),
    };

    if let Some(messages) = graphql_errors(&body) {
        return execution_failure(ExecutionError::GraphQL(messages), query).with_response(body);
    }
    if !status.is_success() {
        return execution_failure(ExecutionError::Status(status), query).with_response(body);
    }

    CallResult::Success {
        query,
        response: body,
    }
}

/// The messages of a non-empty `errors` array in a GraphQL response
fn graphql_errors(body: &Value) -> Option<String> {
    let errors = body.get("errors")?.as_array().filter(|errors| !errors.is_empty())?;
    Some(
        errors
            .iter()
            .map(|error| {
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Check that an endpoint answers a trivial GraphQL request
pub(crate) async fn probe(
    client: &reqwest::Client,
    endpoint: &Url,
) -> Result<StatusCode, ConnectivityError> {
    let response = client
        .post(endpoint.clone())
        .json(&json!({ "query": PROBE_QUERY }))
        .send()
        .await
        .map_err(|source| ConnectivityError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    if status.is_success() {
        Ok(status)
    } else {
        Err(ConnectivityError::Status {
            endpoint: endpoint.to_string(),
            status,
        })
    }
}
