//! MCP tools to allow an AI agent to introspect a GraphQL schema and execute operations.

pub(crate) mod execute;
pub(crate) mod introspect;
