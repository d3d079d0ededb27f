//! MCP tools to configure the server and report on its session.

pub(crate) mod configure;
pub(crate) mod status;
