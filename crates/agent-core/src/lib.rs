//! # agent-core
//!
//! Agent execution pipeline with provider-agnostic LLM abstraction and
//! fail-open tool-server connections.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Agent                                │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────────┐   │
//! │  │  Grounding  │  │  ToolConnection  │  │    LlmProvider     │   │
//! │  │  (optional) │──│   (optional)     │──│    (Strategy)      │   │
//! │  └─────────────┘  └──────────────────┘  └────────────────────┘   │
//! │                  execute() -> ExecutionResult                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Agents are built from an [`AgentProfile`] and shared behind an `Arc`.
//! Nothing that can fail inside [`Agent::execute`] escapes it: failures are
//! folded into an [`ExecutionResult`] with `success = false`.

pub mod agent;
pub mod config;
pub mod error;
pub mod grounding;
pub mod message;
pub mod provider;
pub mod registry;
pub mod result;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentKind, AgentProfile, BuiltContext};
pub use config::{AgentConfiguration, ConfigOverrides, ConfigResolver, ConfigSource, EnvSource};
pub use error::{AgentError, Result};
pub use grounding::{GroundingSnapshot, GroundingSource};
pub use message::{Message, Role};
pub use provider::LlmProvider;
pub use registry::AgentRegistry;
pub use result::ExecutionResult;
pub use tool::{
    RemoteTool, ToolConnection, ToolServerClient, ToolServerConnector, ToolServerDescriptor,
    ToolServerSet, TransportKind,
};
