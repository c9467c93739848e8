//! # agent-runtime
//!
//! Concrete adapters behind the `agent-core` traits.
//!
//! ## Adapters
//!
//! - **OpenAI-compatible** (default): chat completions against a LiteLLM
//!   proxy or any `/chat/completions` endpoint
//! - **MCP** (default): tool listing from MCP servers over streamable HTTP
//!   or SSE, via `rust-mcp-sdk`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{McpHttpClient, OpenAiProvider};
//!
//! let configuration = ConfigResolver::from_env().resolve();
//! let provider = Arc::new(OpenAiProvider::from_configuration(&configuration)?);
//! let connector = ToolServerConnector::new(Arc::new(McpHttpClient::with_defaults()));
//! let agent = AgentProfile::chat().build(configuration, provider, &connector).await?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

#[cfg(feature = "mcp")]
pub use mcp::{McpClientConfig, McpHttpClient};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, AgentKind, AgentProfile, ExecutionResult, LlmProvider, Message, Result,
    Role, ToolServerClient, ToolServerConnector,
};
