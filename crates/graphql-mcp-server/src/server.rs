use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bon::bon;
use rmcp::ServiceExt as _;
use rmcp::transport::StreamableHttpService;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use tracing::{error, info};

use crate::errors::ServerError;
use crate::session::SessionDefaults;

mod dispatcher;
mod states;
mod tools;

use dispatcher::Dispatcher;

/// How long to wait after the transport is up before configuring from the defaults
const AUTO_CONFIGURE_DELAY: Duration = Duration::from_millis(500);

/// A GraphQL MCP Server
pub struct Server {
    transport: Transport,
    defaults: SessionDefaults,
    auto_configure: bool,
    schema_ttl: Duration,
}

#[derive(Debug, Clone)]
pub enum Transport {
    Stdio,
    StreamableHttp { address: IpAddr, port: u16 },
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        transport: Transport,
        defaults: SessionDefaults,
        #[builder(default = true)] auto_configure: bool,
        #[builder(default = Duration::from_secs(300))] schema_ttl: Duration,
    ) -> Self {
        Self {
            transport,
            defaults,
            auto_configure,
            schema_ttl,
        }
    }

    /// Serve MCP requests until the transport closes or the process is asked to stop
    pub async fn start(self) -> Result<(), ServerError> {
        let auto_configure = self.auto_configure && self.defaults.endpoint.is_some();
        let dispatcher = Dispatcher::new(self.defaults, self.schema_ttl);
        let auto_configure = async {
            if auto_configure {
                dispatcher.auto_configure(AUTO_CONFIGURE_DELAY).await;
            }
        };

        match self.transport {
            Transport::StreamableHttp { address, port } => {
                info!(port = ?port, address = ?address, "Starting MCP server in Streamable HTTP mode");
                let running = dispatcher.clone();
                let listen_address = SocketAddr::new(address, port);
                let service = StreamableHttpService::new(
                    move || Ok(running.clone()),
                    LocalSessionManager::default().into(),
                    Default::default(),
                );
                let router = axum::Router::new().nest_service("/mcp", service);
                let tcp_listener = tokio::net::TcpListener::bind(listen_address)
                    .await
                    .map_err(ServerError::Bind)?;
                let serve = axum::serve(tcp_listener, router).with_graceful_shutdown(shutdown_signal());

                let (served, ()) = tokio::join!(serve.into_future(), auto_configure);
                served.map_err(ServerError::Serve)?;
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let service = dispatcher
                    .clone()
                    .serve(stdio())
                    .await
                    .inspect_err(|e| {
                        error!("serving error: {:?}", e);
                    })
                    .map_err(|e| ServerError::McpInitialize(e.to_string()))?;

                let (waited, ()) = tokio::join!(service.waiting(), auto_configure);
                waited.map_err(ServerError::StartupError)?;
            }
        }

        Ok(())
    }
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let occupied = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let port = occupied.local_addr().unwrap().port();

        let error = Server::builder()
            .transport(Transport::StreamableHttp {
                address: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port,
            })
            .defaults(SessionDefaults::default())
            .auto_configure(false)
            .build()
            .start()
            .await
            .unwrap_err();

        assert!(matches!(error, ServerError::Bind(_)));
        assert!(
            error
                .to_string()
                .starts_with("Could not bind the HTTP listener")
        );
    }
}
