//! Settings of a GraphQL session
//!
//! Process-level defaults come from the command line and environment. The `configure` tool can
//! override any of them; numeric limits are clamped to their allowed ranges.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use schemars::JsonSchema;
use serde::Deserialize;
use url::Url;

use crate::errors::ConfigurationError;
use crate::operations::Catalog;
use crate::safety::Limits;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_MAX_DEPTH: u32 = 10;
const MIN_MAX_DEPTH: u32 = 1;
const MAX_MAX_DEPTH: u32 = 20;

pub const DEFAULT_MAX_COMPLEXITY: u32 = 100;
const MIN_MAX_COMPLEXITY: u32 = 1;
const MAX_MAX_COMPLEXITY: u32 = 1_000;

/// The header carrying an API key credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Defaults applied to every configuration, resolved once at startup
#[derive(Debug, Clone, Default)]
pub struct SessionDefaults {
    pub endpoint: Option<String>,
    pub headers: HeaderMap,
    pub timeout_ms: Option<i64>,
    pub max_depth: Option<i64>,
    pub max_complexity: Option<i64>,
    pub disabled_resolvers: Option<Vec<String>>,
    /// Why the header sources could not be folded into `headers`. Reported by every
    /// configuration instead of stopping the process.
    pub header_error: Option<String>,
}

/// Explicit settings for a configuration. Each one that is present wins over the default.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct Overrides {
    /// The URL of the GraphQL endpoint
    pub endpoint: Option<String>,

    /// HTTP headers to send with every request, merged over the default headers
    pub headers: Option<BTreeMap<String, String>>,

    /// Request timeout in milliseconds (1000 to 60000)
    pub timeout: Option<i64>,

    /// Maximum selection depth of an operation (1 to 20)
    #[serde(alias = "maxDepth")]
    pub max_depth: Option<i64>,

    /// Maximum number of fields with selections or arguments in an operation (1 to 1000)
    #[serde(alias = "maxComplexity")]
    pub max_complexity: Option<i64>,

    /// Root fields that must not be exposed or queried
    #[serde(alias = "disabledResolvers")]
    pub disabled_resolvers: Option<Vec<String>>,
}

/// The resolved settings of one session. Replaced as a whole on reconfiguration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    endpoint: Url,
    headers: HeaderMap,
    timeout_ms: u64,
    limits: Limits,
}

impl SessionConfig {
    /// Merge explicit overrides over the defaults
    pub fn resolve(
        defaults: &SessionDefaults,
        overrides: Overrides,
    ) -> Result<Self, ConfigurationError> {
        let endpoint = overrides
            .endpoint
            .or_else(|| defaults.endpoint.clone())
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or(ConfigurationError::MissingEndpoint)?;
        let endpoint = parse_endpoint(endpoint.trim())?;

        if let Some(error) = &defaults.header_error {
            return Err(ConfigurationError::DefaultHeaders(error.clone()));
        }

        let mut headers = defaults.headers.clone();
        for (name, value) in overrides.headers.unwrap_or_default() {
            headers.insert(HeaderName::from_str(&name)?, HeaderValue::from_str(&value)?);
        }

        let timeout_ms = clamp(
            overrides.timeout.or(defaults.timeout_ms),
            DEFAULT_TIMEOUT_MS,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        );
        let max_depth = clamp(
            overrides.max_depth.or(defaults.max_depth),
            DEFAULT_MAX_DEPTH.into(),
            MIN_MAX_DEPTH.into(),
            MAX_MAX_DEPTH.into(),
        );
        let max_complexity = clamp(
            overrides.max_complexity.or(defaults.max_complexity),
            DEFAULT_MAX_COMPLEXITY.into(),
            MIN_MAX_COMPLEXITY.into(),
            MAX_MAX_COMPLEXITY.into(),
        );
        let disabled_resolvers: BTreeSet<String> = overrides
            .disabled_resolvers
            .or_else(|| defaults.disabled_resolvers.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(Self {
            endpoint,
            headers,
            timeout_ms,
            limits: Limits {
                max_depth: u32::try_from(max_depth).unwrap_or(DEFAULT_MAX_DEPTH),
                max_complexity: u32::try_from(max_complexity).unwrap_or(DEFAULT_MAX_COMPLEXITY),
                disabled_resolvers,
            },
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Build an HTTP client that sends the session headers and enforces the session timeout
    pub fn client(&self) -> Result<reqwest::Client, ConfigurationError> {
        let mut headers = self.headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(ConfigurationError::Client)
    }
}

/// A configured session: its settings, HTTP client and tool catalog
#[derive(Debug)]
pub struct Session {
    pub config: SessionConfig,
    pub client: reqwest::Client,
    pub catalog: Catalog,
    /// Why the schema could not be introspected, when the catalog is empty because of it
    pub introspection_error: Option<String>,
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(endpoint).map_err(|source| ConfigurationError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigurationError::UnsupportedScheme(scheme.to_string())),
    }
}

fn clamp(value: Option<i64>, default: u64, min: u64, max: u64) -> u64 {
    match value {
        None => default,
        Some(value) if value < 0 => min,
        Some(value) => (value as u64).clamp(min, max),
    }
}

/// Parse `Name: value` header lines from the command line
pub fn parse_headers(headers: Vec<String>) -> Result<HeaderMap, ConfigurationError> {
    let mut default_headers = HeaderMap::new();
    for header in headers {
        let parts: Vec<&str> = header.splitn(2, ':').map(|s| s.trim()).collect();
        match (parts.first(), parts.get(1)) {
            (Some(key), Some(value)) => {
                default_headers.append(HeaderName::from_str(key)?, HeaderValue::from_str(value)?);
            }
            _ => return Err(ConfigurationError::Header(header)),
        }
    }
    Ok(default_headers)
}

/// Fold all header sources into the default headers: the JSON map first, then header lines,
/// then the credentials, each replacing same-named headers of the previous source
pub fn default_headers(
    headers_json: Option<&str>,
    header_lines: Vec<String>,
    auth_token: Option<&str>,
    api_key: Option<&str>,
) -> Result<HeaderMap, ConfigurationError> {
    let mut headers = HeaderMap::new();

    if let Some(json) = headers_json.filter(|json| !json.trim().is_empty()) {
        let map: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(ConfigurationError::HeadersJson)?;
        for (name, value) in map {
            headers.insert(HeaderName::from_str(&name)?, HeaderValue::from_str(&value)?);
        }
    }

    let lines = parse_headers(header_lines)?;
    for name in lines.keys() {
        headers.remove(name);
    }
    for (name, value) in lines.iter() {
        headers.append(name.clone(), value.clone());
    }

    if let Some(token) = auth_token.filter(|token| !token.is_empty()) {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }
    if let Some(key) = api_key.filter(|key| !key.is_empty()) {
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(key)?,
        );
    }

    Ok(headers)
}
