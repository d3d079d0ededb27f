use std::time::Duration;

use rmcp::model::{CallToolResult, Content, Tool};
use serde::Serialize;
use serde_json::Map;

use crate::errors::McpError;
use crate::safety::Limits;
use crate::server::states::State;

/// The name of the tool to report on the current session
pub const GET_STATUS_TOOL_NAME: &str = "get_status";

#[derive(Clone)]
pub struct GetStatus {
    pub tool: Tool,
}

impl GetStatus {
    pub fn new() -> Self {
        let mut schema = Map::new();
        schema.insert("type".to_string(), "object".into());
        schema.insert("properties".to_string(), Map::new().into());
        Self {
            tool: Tool::new(
                GET_STATUS_TOOL_NAME,
                "Get the status of the server: whether it is configured, the endpoint and limits in use, the age of the cached schema and the number of dynamic tools.",
                schema,
            ),
        }
    }

    pub fn execute(&self, state: &State, schema_ttl: Duration) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::json(Status::new(
            state, schema_ttl,
        ))?]))
    }
}

impl Default for GetStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time report on the session
#[derive(Debug, Serialize)]
pub struct Status {
    state: &'static str,
    configured: bool,
    endpoint: Option<String>,
    timeout_ms: Option<u64>,
    limits: Option<Limits>,
    has_headers: bool,
    schema_cache: SchemaCache,
    dynamic_tools: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    introspection_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SchemaCache {
    cached: bool,
    age_seconds: Option<u64>,
    ttl_seconds: u64,
    stale: bool,
    include_deprecated: Option<bool>,
}

impl Status {
    pub fn new(state: &State, schema_ttl: Duration) -> Self {
        let session = state.session();
        let snapshot = session.and_then(|session| session.catalog.snapshot());
        Self {
            state: state.name(),
            configured: session.is_some(),
            endpoint: session.map(|session| session.config.endpoint().to_string()),
            timeout_ms: session.map(|session| session.config.timeout_ms()),
            limits: session.map(|session| session.config.limits().clone()),
            has_headers: session.is_some_and(|session| !session.config.headers().is_empty()),
            schema_cache: SchemaCache {
                cached: snapshot.is_some(),
                age_seconds: snapshot.map(|snapshot| snapshot.age().as_secs()),
                ttl_seconds: schema_ttl.as_secs(),
                stale: snapshot.is_some_and(|snapshot| snapshot.is_stale(schema_ttl)),
                include_deprecated: snapshot.map(|snapshot| snapshot.include_deprecated()),
            },
            dynamic_tools: session.map_or(0, |session| session.catalog.len()),
            introspection_error: session.and_then(|session| session.introspection_error.clone()),
        }
    }
}
