//! Tool Servers
//!
//! Descriptors for externally hosted tool servers, the client trait used to
//! reach them, and the fail-open connector agents use during setup.
//!
//! ```text
//! ToolServerSet ──setup()──▶ Some(ToolConnection { tools })   reachable
//!                        └─▶ None                             any failure
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Hosted web-search tool server
pub const WEB_SEARCH_SERVER_URL: &str = "https://mcp.codexhub.ai/web/mcp";

/// Header carrying the team credential for hosted tool servers
pub const TEAM_KEY_HEADER: &str = "x-team-key";

/// Transport used to reach a tool server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Streamable HTTP (JSON-RPC over POST)
    #[serde(alias = "streamable_http")]
    Http,
    /// Server-sent events transport
    Sse,
}

/// One tool server endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServerDescriptor {
    #[serde(rename = "type")]
    pub transport: TransportKind,

    pub url: String,

    /// Sent verbatim on every request (e.g. auth headers)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ToolServerDescriptor {
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::Http,
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Reject descriptors that cannot possibly connect, before any I/O
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AgentError::MalformedDescriptor("empty url".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AgentError::MalformedDescriptor(format!(
                "unsupported url scheme: {url}"
            )));
        }
        if self.headers.keys().any(|name| name.trim().is_empty()) {
            return Err(AgentError::MalformedDescriptor(format!(
                "empty header name for {url}"
            )));
        }
        Ok(())
    }
}

/// Tool servers owned by a single agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolServerSet(Vec<ToolServerDescriptor>);

impl ToolServerSet {
    pub const fn new(servers: Vec<ToolServerDescriptor>) -> Self {
        Self(servers)
    }

    /// The hosted web-search server, authenticated with the team credential
    pub fn web_search(team_key: impl Into<String>) -> Self {
        Self(vec![
            ToolServerDescriptor::http(WEB_SEARCH_SERVER_URL)
                .with_header(TEAM_KEY_HEADER, team_key),
        ])
    }

    pub fn servers(&self) -> &[ToolServerDescriptor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A callable tool exposed by a tool server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    /// Tool identifier
    pub name: String,

    /// Human-readable description (shown to the LLM)
    #[serde(default)]
    pub description: String,

    /// JSON Schema of the arguments
    #[serde(default = "empty_object_schema")]
    pub input_schema: serde_json::Value,

    /// URL of the server exposing it
    #[serde(default)]
    pub server: String,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// Live handle to a tool server set plus its resolved tools
#[derive(Clone, Debug)]
pub struct ToolConnection {
    servers: ToolServerSet,
    tools: Vec<RemoteTool>,
}

impl ToolConnection {
    pub const fn new(servers: ToolServerSet, tools: Vec<RemoteTool>) -> Self {
        Self { servers, tools }
    }

    pub const fn servers(&self) -> &ToolServerSet {
        &self.servers
    }

    pub fn tools(&self) -> &[RemoteTool] {
        &self.tools
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Client for a tool-server transport
#[async_trait]
pub trait ToolServerClient: Send + Sync {
    /// Connect to every server in the set and list their tools
    async fn list_tools(&self, servers: &ToolServerSet) -> Result<Vec<RemoteTool>>;
}

/// Fail-open connector used during agent setup
#[derive(Clone)]
pub struct ToolServerConnector {
    client: Arc<dyn ToolServerClient>,
}

impl ToolServerConnector {
    pub fn new(client: Arc<dyn ToolServerClient>) -> Self {
        Self { client }
    }

    /// Connect and resolve tools, reporting failures as errors
    pub async fn connect(&self, servers: &ToolServerSet) -> Result<ToolConnection> {
        if servers.is_empty() {
            return Err(AgentError::MalformedDescriptor("no tool servers given".into()));
        }
        for descriptor in servers.servers() {
            descriptor.validate()?;
        }

        let tools = self.client.list_tools(servers).await?;
        Ok(ToolConnection::new(servers.clone(), tools))
    }

    /// Connect and resolve tools; any failure yields `None`.
    ///
    /// Callers must not run this concurrently for the same agent.
    pub async fn setup(&self, servers: &ToolServerSet) -> Option<ToolConnection> {
        match self.connect(servers).await {
            Ok(connection) => {
                tracing::info!(
                    servers = servers.len(),
                    tools = connection.tools().len(),
                    "Tool servers connected"
                );
                Some(connection)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Tool server setup failed, continuing without tools");
                None
            }
        }
    }
}
