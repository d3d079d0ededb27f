use std::fmt;

use rmcp::model::Tool;

use crate::schema_from_type;
use crate::session::{Overrides, Session};

/// The name of the tool to point the server at a GraphQL endpoint
pub const CONFIGURE_TOOL_NAME: &str = "configure";

#[derive(Clone)]
pub struct Configure {
    pub tool: Tool,
}

impl Configure {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                CONFIGURE_TOOL_NAME,
                "Connect to a GraphQL endpoint. Any setting that is left out falls back to the server defaults. On success the schema is introspected and one tool is added for each query and mutation field. Calling it again replaces the previous configuration.",
                schema_from_type!(Overrides),
            ),
        }
    }
}

impl Default for Configure {
    fn default() -> Self {
        Self::new()
    }
}

/// The applied settings of a new session, as reported to the caller
pub struct Summary<'a>(pub &'a Session);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.0;
        let limits = session.config.limits();
        writeln!(f, "Configured GraphQL endpoint {}", session.config.endpoint())?;
        writeln!(f, "Timeout: {} ms", session.config.timeout_ms())?;
        writeln!(f, "Max depth: {}", limits.max_depth)?;
        writeln!(f, "Max complexity: {}", limits.max_complexity)?;
        if limits.disabled_resolvers.is_empty() {
            writeln!(f, "Disabled resolvers: none")?;
        } else {
            let names: Vec<&str> = limits
                .disabled_resolvers
                .iter()
                .map(String::as_str)
                .collect();
            writeln!(f, "Disabled resolvers: {}", names.join(", "))?;
        }
        writeln!(f, "Headers: {}", session.config.headers().len())?;
        if let Some(error) = &session.introspection_error {
            writeln!(f, "Introspection failed: {error}")?;
        }
        write!(f, "Dynamic tools: {}", session.catalog.len())
    }
}
