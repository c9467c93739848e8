//! MCP Tool-Server Client
//!
//! Lists tools from MCP servers with the `rust-mcp-sdk` client runtime, over
//! streamable HTTP or SSE depending on the descriptor. Each listing opens a
//! session, pages through `tools/list`, and shuts the session down again,
//! whether or not the listing succeeded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    tool::{RemoteTool, ToolServerClient, ToolServerDescriptor, ToolServerSet, TransportKind},
};
use async_trait::async_trait;
use rust_mcp_sdk::mcp_client::{
    ClientHandlerCore, ClientRuntime, McpClientOptions, ToMcpClientHandlerCore,
    client_runtime_core,
};
use rust_mcp_sdk::schema::schema_utils::{NotificationFromServer, ResultFromClient};
use rust_mcp_sdk::schema::{
    self, ClientCapabilities, Implementation, InitializeRequestParams, LATEST_PROTOCOL_VERSION,
    PaginatedRequestParams, RpcError, ServerJsonrpcRequest,
};
use rust_mcp_sdk::{
    ClientSseTransport, ClientSseTransportOptions, McpClient, RequestOptions,
    StreamableTransportOptions,
};

/// Upper bound on `tools/list` pages per server
const MAX_PAGES: usize = 32;

/// MCP client configuration
#[derive(Clone, Debug)]
pub struct McpClientConfig {
    /// Bound on each protocol step (start, one page, shutdown)
    pub timeout: Duration,

    /// Name sent in `clientInfo`
    pub client_name: String,
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            client_name: "listing-agents".into(),
        }
    }
}

/// MCP client over the HTTP transports
#[derive(Clone, Debug, Default)]
pub struct McpHttpClient {
    config: McpClientConfig,
}

/// One page of `tools/list`
struct ToolPage {
    tools: Vec<RemoteTool>,
    next_cursor: Option<String>,
}

/// An MCP session against one server
#[async_trait]
trait ToolSession: Send + Sync {
    async fn start(&self) -> Result<()>;
    async fn list_page(&self, cursor: Option<String>) -> Result<ToolPage>;
    async fn shut_down(&self) -> Result<()>;
}

impl McpHttpClient {
    pub const fn new(config: McpClientConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    fn client_details(&self) -> InitializeRequestParams {
        InitializeRequestParams {
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: self.config.client_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                description: None,
                icons: Vec::new(),
                website_url: None,
            },
            protocol_version: LATEST_PROTOCOL_VERSION.into(),
            meta: None,
        }
    }

    /// Open a client runtime for the descriptor's transport
    fn connect(&self, descriptor: &ToolServerDescriptor) -> Result<SdkSession> {
        let headers: HashMap<String, String> = descriptor
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let client = match descriptor.transport {
            TransportKind::Http => {
                let options = StreamableTransportOptions {
                    mcp_url: descriptor.url.clone(),
                    request_options: RequestOptions {
                        request_timeout: self.config.timeout,
                        custom_headers: Some(headers),
                        ..RequestOptions::default()
                    },
                };
                client_runtime_core::with_transport_options(
                    self.client_details(),
                    options,
                    SilentHandler,
                    None,
                    None,
                )
            }
            TransportKind::Sse => {
                let options = ClientSseTransportOptions {
                    request_timeout: self.config.timeout,
                    custom_headers: Some(headers),
                    ..ClientSseTransportOptions::default()
                };
                let transport = ClientSseTransport::new(&descriptor.url, options).map_err(|e| {
                    AgentError::ToolServer(format!("{}: transport error: {e}", descriptor.url))
                })?;
                client_runtime_core::create_client(McpClientOptions {
                    client_details: self.client_details(),
                    transport,
                    handler: SilentHandler.to_mcp_client_handler(),
                    task_store: None,
                    server_task_store: None,
                })
            }
        };

        Ok(SdkSession {
            client,
            url: descriptor.url.clone(),
            timeout: self.config.timeout,
        })
    }

    async fn list_server_tools(
        &self,
        descriptor: &ToolServerDescriptor,
    ) -> Result<Vec<RemoteTool>> {
        let session = self.connect(descriptor)?;
        enumerate(&session).await
    }
}

/// Start a session, page through its tools, then always shut it down
async fn enumerate(session: &dyn ToolSession) -> Result<Vec<RemoteTool>> {
    let listed = match session.start().await {
        Ok(()) => fetch_tools(session).await,
        Err(e) => Err(e),
    };

    if let Err(e) = session.shut_down().await {
        tracing::debug!(error = %e, "MCP session shutdown failed");
    }
    listed
}

async fn fetch_tools(session: &dyn ToolSession) -> Result<Vec<RemoteTool>> {
    let mut tools = Vec::new();
    let mut cursor = None;

    for _ in 0..MAX_PAGES {
        let page = session.list_page(cursor.take()).await?;
        tools.extend(page.tools);

        match page.next_cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => return Ok(tools),
        }
    }

    tracing::warn!(tools = tools.len(), "tools/list pagination limit reached");
    Ok(tools)
}

/// `rust-mcp-sdk` client runtime bound to one server
struct SdkSession {
    client: Arc<ClientRuntime>,
    url: String,
    timeout: Duration,
}

impl SdkSession {
    async fn bounded<T, E, F>(&self, step: &str, future: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>> + Send,
        E: std::fmt::Display,
    {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| AgentError::ToolServer(format!("{}: {step} timed out", self.url)))?
            .map_err(|e| AgentError::ToolServer(format!("{}: {step} error: {e}", self.url)))
    }
}

#[async_trait]
impl ToolSession for SdkSession {
    async fn start(&self) -> Result<()> {
        self.bounded("start", self.client.clone().start()).await?;
        tracing::debug!(server = %self.url, "MCP session initialized");
        Ok(())
    }

    async fn list_page(&self, cursor: Option<String>) -> Result<ToolPage> {
        let params = cursor.map(|cursor| PaginatedRequestParams {
            cursor: Some(cursor),
            meta: None,
        });
        let listed = self
            .bounded("list_tools", self.client.list_tools(params))
            .await?;

        let tools = listed
            .tools
            .into_iter()
            .map(|tool| {
                Ok(RemoteTool {
                    input_schema: serde_json::to_value(&tool.input_schema)?,
                    name: tool.name,
                    description: tool.description.unwrap_or_default(),
                    server: self.url.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ToolPage {
            tools,
            next_cursor: listed.next_cursor,
        })
    }

    async fn shut_down(&self) -> Result<()> {
        self.bounded("shutdown", self.client.shut_down()).await
    }
}

#[async_trait]
impl ToolServerClient for McpHttpClient {
    async fn list_tools(&self, servers: &ToolServerSet) -> Result<Vec<RemoteTool>> {
        let mut tools = Vec::new();
        for descriptor in servers.servers() {
            let server_tools = self.list_server_tools(descriptor).await?;
            tracing::info!(
                server = %descriptor.url,
                tools = server_tools.len(),
                "Listed MCP tools"
            );
            tools.extend(server_tools);
        }
        Ok(tools)
    }
}

/// Client handler that only answers pings; listing tools needs no callbacks
#[derive(Clone)]
struct SilentHandler;

#[async_trait]
impl ClientHandlerCore for SilentHandler {
    async fn handle_request(
        &self,
        request: ServerJsonrpcRequest,
        _runtime: &dyn McpClient,
    ) -> std::result::Result<ResultFromClient, RpcError> {
        match request {
            ServerJsonrpcRequest::PingRequest(_) => Ok(schema::Result::default().into()),
            _ => Err(RpcError::method_not_found()),
        }
    }

    async fn handle_notification(
        &self,
        _notification: NotificationFromServer,
        _runtime: &dyn McpClient,
    ) -> std::result::Result<(), RpcError> {
        Ok(())
    }

    async fn handle_error(
        &self,
        _error: &RpcError,
        _runtime: &dyn McpClient,
    ) -> std::result::Result<(), RpcError> {
        Ok(())
    }
}
