use reqwest::StatusCode;
use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use serde::Serialize;
use tokio::task::JoinError;

/// The category of a failure reported back to an MCP client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Connectivity,
    Introspection,
    Validation,
    Execution,
    Internal,
}

/// An error in resolving the settings for a session
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No GraphQL endpoint was provided and GRAPHQL_ENDPOINT is not set")]
    MissingEndpoint,

    #[error("Invalid GraphQL endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("Unsupported scheme {0} for the GraphQL endpoint, expected http or https")]
    UnsupportedScheme(String),

    #[error("invalid header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    #[error("invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("invalid header: {0}")]
    Header(String),

    #[error("GRAPHQL_HEADERS must be a JSON object of string values: {0}")]
    HeadersJson(serde_json::Error),

    #[error("The default headers are invalid, fix them and restart the server: {0}")]
    DefaultHeaders(String),

    #[error("Could not build the HTTP client: {0}")]
    Client(reqwest::Error),
}

/// A failure to reach the GraphQL endpoint while configuring
#[derive(Debug, thiserror::Error)]
pub enum ConnectivityError {
    #[error("Could not reach {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("{endpoint} answered the connectivity probe with HTTP {status}")]
    Status { endpoint: String, status: StatusCode },
}

/// A failure to fetch or read the schema of the GraphQL endpoint
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("Failed to send the introspection query: {0}")]
    Transport(reqwest::Error),

    #[error("Introspection query failed with HTTP {0}")]
    Status(StatusCode),

    #[error("Failed to read the introspection response body: {0}")]
    Body(reqwest::Error),

    #[error("Introspection query returned errors: {0}")]
    GraphQL(String),

    #[error("Introspection response has no data.__schema")]
    MissingSchema,

    #[error("Could not read the introspected schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// A rejected operation or input, reported without contacting the endpoint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Query complexity {score} exceeds the maximum of {max}")]
    Complexity { score: usize, max: u32 },

    #[error("Query depth {depth} exceeds the maximum of {max}")]
    Depth { depth: usize, max: u32 },

    #[error("Query references the disabled resolver `{0}`")]
    DisabledResolver(String),

    #[error("Invalid arguments: {}", .0.join("; "))]
    Arguments(Vec<String>),

    #[error("Invalid input: {0}")]
    Input(String),
}

/// A failure while executing an operation against the endpoint
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Failed to send GraphQL request: {0}")]
    Transport(reqwest::Error),

    #[error("Failed to read GraphQL response body: {0}")]
    Body(reqwest::Error),

    #[error("GraphQL request failed with HTTP {0}")]
    Status(StatusCode),

    #[error("GraphQL errors: {0}")]
    GraphQL(String),
}

/// The outcome of a `configure` call that did not produce a session
#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
}

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Could not bind the HTTP listener: {0}")]
    Bind(std::io::Error),

    #[error("The HTTP server failed: {0}")]
    Serve(std::io::Error),

    #[error("Failed to initialize the MCP service: {0}")]
    McpInitialize(String),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;
