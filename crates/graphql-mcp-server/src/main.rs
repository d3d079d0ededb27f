use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use graphql_mcp_server::server::{Server, Transport};
use graphql_mcp_server::session::{SessionDefaults, default_headers};
use runtime::{LogRotationKind, Logging};
use tracing::{Level, info, warn};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    styles = STYLES,
    about = "GraphQL MCP Server - expose any GraphQL API to an AI agent",
)]
struct Args {
    /// The GraphQL endpoint to configure at startup and to fall back to in `configure`
    #[arg(long, short = 'e', env = "GRAPHQL_ENDPOINT")]
    endpoint: Option<String>,

    /// Default request timeout in milliseconds (1000 to 60000)
    #[arg(long, env = "GRAPHQL_TIMEOUT", allow_negative_numbers = true)]
    timeout: Option<i64>,

    /// Default maximum selection depth of an operation (1 to 20)
    #[arg(long, env = "GRAPHQL_MAX_DEPTH", allow_negative_numbers = true)]
    max_depth: Option<i64>,

    /// Default maximum complexity of an operation (1 to 1000)
    #[arg(long, env = "GRAPHQL_MAX_COMPLEXITY", allow_negative_numbers = true)]
    max_complexity: Option<i64>,

    /// Root fields (comma separated) that must not be exposed or queried
    #[arg(long, env = "GRAPHQL_DISABLED_RESOLVERS", value_delimiter = ',')]
    disabled_resolvers: Option<Vec<String>>,

    /// Headers to send to the endpoint, as a JSON object of header names to values
    #[arg(long = "headers", env = "GRAPHQL_HEADERS", hide_env_values = true)]
    headers_json: Option<String>,

    /// A bearer token sent as the `Authorization` header
    #[arg(long, env = "GRAPHQL_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// An API key sent as the `X-API-Key` header
    #[arg(long, env = "GRAPHQL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Headers to send to the endpoint, as `Name: value`
    #[arg(long = "header", action = clap::ArgAction::Append)]
    headers: Vec<String>,

    /// The IP address to bind the Streamable HTTP server to
    ///
    /// [default: 127.0.0.1]
    #[arg(long)]
    http_address: Option<IpAddr>,

    /// Start the server using the Streamable HTTP transport on the given port
    ///
    /// [default: 5000]
    #[arg(long)]
    http_port: Option<u16>,

    /// Do not configure from the defaults at startup, wait for the `configure` tool instead
    #[arg(long)]
    no_auto_configure: bool,

    /// Seconds after which the cached schema is reported as stale
    #[arg(long, env = "GRAPHQL_SCHEMA_TTL", default_value_t = 300)]
    schema_ttl: u64,

    /// The log level for the MCP Server
    #[arg(long = "log", short = 'l', global = true, env = "GRAPHQL_MCP_LOG", default_value_t = Level::INFO)]
    log_level: Level,

    /// A directory to write rolling log files to instead of stderr
    #[arg(long, env = "GRAPHQL_MCP_LOG_PATH")]
    log_path: Option<PathBuf>,

    /// Log file rotation period, used with `--log-path`
    #[arg(long, env = "GRAPHQL_MCP_LOG_ROTATION", value_enum, ignore_case = true, default_value_t)]
    log_rotation: LogRotationKind,
}

impl Args {
    fn transport(&self) -> Transport {
        if self.http_port.is_some() || self.http_address.is_some() {
            Transport::StreamableHttp {
                address: self
                    .http_address
                    .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
                port: self.http_port.unwrap_or(5000),
            }
        } else {
            Transport::Stdio
        }
    }

    fn logging(&self) -> Logging {
        Logging {
            level: self.log_level,
            path: self.log_path.clone(),
            rotation: self.log_rotation,
        }
    }

    /// The defaults for every configuration. Broken header sources do not stop the server, they
    /// are reported when it is configured.
    fn session_defaults(self) -> SessionDefaults {
        let headers = default_headers(
            self.headers_json.as_deref(),
            self.headers,
            self.auth_token.as_deref(),
            self.api_key.as_deref(),
        );
        let header_error = headers.as_ref().err().map(ToString::to_string);
        if let Some(error) = &header_error {
            warn!("Ignoring the default headers: {error}");
        }

        SessionDefaults {
            headers: headers.unwrap_or_default(),
            header_error,
            endpoint: self.endpoint.filter(|endpoint| !endpoint.trim().is_empty()),
            timeout_ms: self.timeout,
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            disabled_resolvers: self.disabled_resolvers,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = args.logging().setup()?;

    info!(
        "GraphQL MCP Server v{}",
        std::env!("CARGO_PKG_VERSION")
    );

    let transport = args.transport();
    let auto_configure = !args.no_auto_configure;
    let schema_ttl = Duration::from_secs(args.schema_ttl);
    let defaults = args.session_defaults();
    match &defaults.endpoint {
        Some(endpoint) => info!("Default GraphQL endpoint: {endpoint}"),
        None => info!("No default GraphQL endpoint, call the `configure` tool to set one"),
    }

    Ok(Server::builder()
        .transport(transport)
        .defaults(defaults)
        .auto_configure(auto_configure)
        .schema_ttl(schema_ttl)
        .build()
        .start()
        .await?)
}
