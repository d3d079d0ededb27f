use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    Peer, RoleServer, ServerHandler, ServiceError,
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorCode, InitializeRequestParam,
        InitializeResult, JsonObject, ListToolsResult, PaginatedRequestParam, ServerCapabilities,
        ServerInfo, Tool,
    },
    service::RequestContext,
};
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    errors::{ConfigureError, ErrorKind, McpError},
    graphql::{self, CallResult, Executable as _},
    introspection::{
        fetch_schema,
        tools::{
            execute::{EXECUTE_TOOL_NAME, Execute},
            introspect::{INTROSPECT_TOOL_NAME, Introspect},
        },
    },
    operations::Catalog,
    session::{Overrides, Session, SessionConfig, SessionDefaults},
};

use super::states::State;
use super::tools::{
    configure::{CONFIGURE_TOOL_NAME, Configure, Summary},
    status::{GET_STATUS_TOOL_NAME, GetStatus},
};

/// Routes MCP requests to the static tools and to the tools of the current session
#[derive(Clone)]
pub(crate) struct Dispatcher {
    defaults: Arc<SessionDefaults>,
    state: Arc<RwLock<State>>,
    configuring: Arc<Mutex<()>>,
    peers: Arc<RwLock<Vec<Peer<RoleServer>>>>,
    configure_tool: Configure,
    introspect_tool: Introspect,
    execute_tool: Execute,
    status_tool: GetStatus,
    schema_ttl: Duration,
}

impl Dispatcher {
    pub(crate) fn new(defaults: SessionDefaults, schema_ttl: Duration) -> Self {
        Self {
            defaults: Arc::new(defaults),
            state: Arc::new(RwLock::new(State::Unconfigured)),
            configuring: Arc::new(Mutex::new(())),
            peers: Arc::new(RwLock::new(Vec::new())),
            configure_tool: Configure::new(),
            introspect_tool: Introspect::new(),
            execute_tool: Execute::new(),
            status_tool: GetStatus::new(),
            schema_ttl,
        }
    }

    /// Replace the session. Only one configuration runs at a time, and peers are notified of the
    /// tool list change whatever the outcome.
    pub(crate) async fn configure(&self, overrides: Overrides) -> Result<CallToolResult, McpError> {
        let _configuring = self.configuring.lock().await;
        *self.state.write().await = State::Configuring;

        let outcome = match self.connect(overrides).await {
            Ok(session) => {
                let summary = Summary(&session).to_string();
                info!("{summary}");
                *self.state.write().await = State::Configured(Arc::new(session));
                Ok(CallToolResult::success(vec![Content::text(summary)]))
            }
            Err(ConfigureError::Configuration(error)) => {
                warn!("Invalid configuration: {error}");
                *self.state.write().await = State::Unconfigured;
                Err(McpError::new(
                    ErrorCode::INVALID_PARAMS,
                    error.to_string(),
                    Some(json!({ "kind": ErrorKind::Configuration })),
                ))
            }
            Err(ConfigureError::Connectivity(error)) => {
                warn!("Connectivity check failed: {error}");
                *self.state.write().await = State::Unconfigured;
                Ok(CallResult::failure(ErrorKind::Connectivity, error, None).into_tool_result())
            }
        };

        Self::notify_tool_list_changed(self.peers.clone()).await;
        outcome
    }

    /// Resolve the settings, check the endpoint answers, then build the tool catalog. A failed
    /// introspection still yields a session, just one without dynamic tools.
    async fn connect(&self, overrides: Overrides) -> Result<Session, ConfigureError> {
        let config = SessionConfig::resolve(&self.defaults, overrides)?;
        let client = config.client()?;
        graphql::probe(&client, config.endpoint()).await?;

        let (catalog, introspection_error) =
            match fetch_schema(&client, config.endpoint(), false).await {
                Ok(snapshot) => (
                    Catalog::rebuild(Arc::new(snapshot), &config.limits().disabled_resolvers),
                    None,
                ),
                Err(error) => {
                    warn!("Introspection of {} failed: {error}", config.endpoint());
                    (Catalog::default(), Some(error.to_string()))
                }
            };

        Ok(Session {
            config,
            client,
            catalog,
            introspection_error,
        })
    }

    /// Configure from the defaults once the transport is up, when a default endpoint exists
    pub(crate) async fn auto_configure(&self, delay: Duration) {
        if self.defaults.endpoint.is_none() {
            debug!("No default endpoint, waiting for the configure tool");
            return;
        }
        tokio::time::sleep(delay).await;
        match self.configure(Overrides::default()).await {
            Ok(result) if result.is_error != Some(true) => {
                info!("Configured from the environment");
            }
            Ok(_) => warn!("Could not configure from the environment"),
            Err(error) => warn!("Could not configure from the environment: {}", error.message),
        }
    }

    /// The session at this moment. Callers hold on to it for the rest of the request.
    async fn session(&self) -> Option<Arc<Session>> {
        self.state.read().await.session().cloned()
    }

    async fn require_session(&self) -> Result<Arc<Session>, McpError> {
        self.session().await.ok_or_else(|| {
            McpError::new(
                ErrorCode::INVALID_REQUEST,
                "The server is not configured, call `configure` first".to_string(),
                None,
            )
        })
    }

    /// Run one of the tools derived from the schema
    pub(crate) async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let session = self.require_session().await?;
        let operation = session
            .catalog
            .find(name)
            .ok_or_else(|| tool_not_found(name, &session.catalog))?;

        Ok(operation
            .execute(graphql::Request {
                input: Value::from(arguments),
                session: &session.config,
                client: &session.client,
            })
            .await
            .into_tool_result())
    }

    async fn execute(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let session = self.require_session().await?;
        Ok(self.execute_tool
            .execute(graphql::Request {
                input: Value::from(arguments),
                session: &session.config,
                client: &session.client,
            })
            .await
            .into_tool_result())
    }

    async fn introspect(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let session = self.require_session().await?;
        self.introspect_tool
            .execute(&session, convert_arguments(arguments)?)
            .await
    }

    async fn status(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.read().await;
        self.status_tool.execute(&state, self.schema_ttl)
    }

    /// The static tools, then the tools of the current session
    pub(crate) async fn tools(&self) -> Vec<Tool> {
        let session = self.session().await;
        [
            &self.configure_tool.tool,
            &self.introspect_tool.tool,
            &self.execute_tool.tool,
            &self.status_tool.tool,
        ]
        .into_iter()
        .cloned()
        .chain(
            session
                .iter()
                .flat_map(|session| session.catalog.tools()),
        )
        .collect()
    }

    /// Notify any peers that tools have changed. Drops unreachable peers from the list.
    async fn notify_tool_list_changed(peers: Arc<RwLock<Vec<Peer<RoleServer>>>>) {
        let mut peers = peers.write().await;
        if !peers.is_empty() {
            debug!(
                "Session changed, notifying {} peers of tool change",
                peers.len()
            );
        }
        let mut retained_peers = Vec::new();
        for peer in peers.iter() {
            if !peer.is_transport_closed() {
                match peer.notify_tool_list_changed().await {
                    Ok(_) => retained_peers.push(peer.clone()),
                    Err(ServiceError::TransportSend(_) | ServiceError::TransportClosed) => {
                        error!("Failed to notify peer of tool list change - dropping peer",);
                    }
                    Err(e) => {
                        error!("Failed to notify peer of tool list change {:?}", e);
                        retained_peers.push(peer.clone());
                    }
                }
            }
        }
        *peers = retained_peers;
    }
}

impl ServerHandler for Dispatcher {
    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        let mut peers = self.peers.write().await;
        peers.push(context.peer);
        Ok(self.get_info())
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        match request.name.as_ref() {
            CONFIGURE_TOOL_NAME => self.configure(convert_arguments(request.arguments)?).await,
            INTROSPECT_TOOL_NAME => self.introspect(request.arguments).await,
            EXECUTE_TOOL_NAME => self.execute(request.arguments).await,
            GET_STATUS_TOOL_NAME => self.status().await,
            name => self.invoke(name, request.arguments).await,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.tools().await,
        })
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build(),
            instructions: Some(
                "Call `configure` with a GraphQL endpoint (unless the server was started with one), then use the generated `query_*` and `mutation_*` tools, or `introspect` and `execute` for hand-written operations.".to_string(),
            ),
            ..Default::default()
        }
    }
}

fn tool_not_found(name: &str, catalog: &Catalog) -> McpError {
    let known: Vec<&str> = [
        CONFIGURE_TOOL_NAME,
        INTROSPECT_TOOL_NAME,
        EXECUTE_TOOL_NAME,
        GET_STATUS_TOOL_NAME,
    ]
    .into_iter()
    .chain(catalog.tool_names())
    .collect();
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Tool {name} not found. Available tools: {}", known.join(", ")),
        None,
    )
}

fn convert_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    serde_json::from_value(Value::from(arguments.unwrap_or_default()))
        .map_err(|e| McpError::new(ErrorCode::INVALID_PARAMS, format!("Invalid input: {e}"), None))
}
