//! Agents and the Execution Pipeline
//!
//! A single [`Agent`] struct covers every variant; what differs between
//! variants is carried by an [`AgentProfile`]: the system prompt, the tool
//! servers to attempt, an optional grounding source and extra capability tags.
//!
//! `execute` runs the pipeline:
//!
//! 1. fetch grounding (grounded variants only, falls back to a placeholder)
//! 2. assemble `[system, user]`
//! 3. pick tool-bound or plain invocation
//! 4. one backend call
//! 5. normalize into an [`ExecutionResult`]
//!
//! Any failure in 1–4 becomes `ExecutionResult { success: false, .. }`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{AgentConfiguration, TOOL_CREDENTIAL_KEY, is_placeholder};
use crate::error::{AgentError, Result};
use crate::grounding::{GroundingSnapshot, GroundingSource};
use crate::message::Message;
use crate::provider::{GenerationOptions, LlmProvider};
use crate::result::{ExecutionResult, META_GROUNDED_RECORDS, META_MODEL, META_TOOLS_USED};
use crate::tool::{RemoteTool, ToolConnection, ToolServerConnector, ToolServerSet};

/// Capabilities every agent advertises
pub const BASE_CAPABILITIES: [&str; 2] = ["text_generation", "conversation"];

/// Advertised iff the agent holds a tool connection
pub const TOOLS_CAPABILITY: &str = "mcp_enabled";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

pub const CHAT_PROMPT: &str =
    "Friendly conversational AI. Natural conversations, explanations, analysis. Helpful, harmless, honest.";

pub const SEARCH_PROMPT: &str =
    "Research assistant with web search tools. Use search for current info, cite sources.";

/// Agent variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Conversational, no tools
    Chat,
    /// Research with web-search tools
    Search,
    /// Real-estate assistant grounded on active listings
    RealEstate,
}

impl AgentKind {
    pub const ALL: [Self; 3] = [Self::Chat, Self::Search, Self::RealEstate];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Search => "search",
            Self::RealEstate => "real_estate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "chat" => Some(Self::Chat),
            "search" => Some(Self::Search),
            "real_estate" => Some(Self::RealEstate),
            _ => None,
        }
    }

    /// Parse a requested agent type; unknown values get the chat agent
    pub fn from_request(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Chat)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Web-search tool servers, or `None` when the gating credential is missing
/// or the placeholder
pub fn gated_web_search(kind: AgentKind, tool_credential: Option<&str>) -> Option<ToolServerSet> {
    match tool_credential.map(str::trim) {
        Some(token) if !token.is_empty() && !is_placeholder(token) => {
            tracing::info!(agent = %kind, "Web search tool server configured");
            Some(ToolServerSet::web_search(token))
        }
        _ => {
            tracing::warn!(agent = %kind, "{} not found, web search disabled", TOOL_CREDENTIAL_KEY);
            None
        }
    }
}

/// Construction-time description of a variant
pub struct AgentProfile {
    kind: AgentKind,
    system_prompt: String,
    tool_servers: Option<ToolServerSet>,
    grounding: Option<Arc<dyn GroundingSource>>,
    capability_tags: Vec<String>,
}

impl AgentProfile {
    pub fn new(kind: AgentKind, system_prompt: impl Into<String>) -> Self {
        Self {
            kind,
            system_prompt: system_prompt.into(),
            tool_servers: None,
            grounding: None,
            capability_tags: Vec::new(),
        }
    }

    /// Conversational variant
    pub fn chat() -> Self {
        Self::new(AgentKind::Chat, CHAT_PROMPT)
    }

    /// Research variant; tools only when the gating credential is usable
    pub fn search(tool_credential: Option<&str>) -> Self {
        let mut profile = Self::new(AgentKind::Search, SEARCH_PROMPT);
        profile.tool_servers = gated_web_search(AgentKind::Search, tool_credential);
        profile
    }

    #[must_use]
    pub fn with_tool_servers(mut self, servers: Option<ToolServerSet>) -> Self {
        self.tool_servers = servers;
        self
    }

    #[must_use]
    pub fn with_grounding(mut self, grounding: Arc<dyn GroundingSource>) -> Self {
        self.grounding = Some(grounding);
        self
    }

    #[must_use]
    pub fn with_capabilities<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capability_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    pub const fn tool_servers(&self) -> Option<&ToolServerSet> {
        self.tool_servers.as_ref()
    }

    /// Construct the agent, then attempt tool setup once if the profile
    /// names tool servers
    pub async fn build(
        self,
        configuration: AgentConfiguration,
        provider: Arc<dyn LlmProvider>,
        connector: &ToolServerConnector,
    ) -> Result<Agent> {
        let mut builder = Agent::builder(configuration)
            .kind(self.kind)
            .system_prompt(self.system_prompt)
            .provider(provider)
            .capabilities(self.capability_tags);
        if let Some(grounding) = self.grounding {
            builder = builder.grounding(grounding);
        }
        let mut agent = builder.build()?;

        if let Some(servers) = self.tool_servers {
            agent.setup_tools(connector, &servers).await;
        }

        Ok(agent)
    }
}

/// Messages for one invocation plus how many grounded records they carry
#[derive(Clone, Debug)]
pub struct BuiltContext {
    pub messages: Vec<Message>,
    /// `Some` only for grounded variants
    pub grounded_records: Option<usize>,
}

/// A configured agent. Shared read-only across concurrent `execute` calls.
pub struct Agent {
    kind: AgentKind,
    configuration: AgentConfiguration,
    system_prompt: String,
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    tool_connection: Option<ToolConnection>,
    grounding: Option<Arc<dyn GroundingSource>>,
    capability_tags: Vec<String>,
}

impl Agent {
    pub fn builder(configuration: AgentConfiguration) -> AgentBuilder {
        AgentBuilder::new(configuration)
    }

    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub const fn configuration(&self) -> &AgentConfiguration {
        &self.configuration
    }

    pub const fn tool_connection(&self) -> Option<&ToolConnection> {
        self.tool_connection.as_ref()
    }

    pub fn is_grounded(&self) -> bool {
        self.grounding.is_some()
    }

    /// Attempt tool setup and record the outcome.
    ///
    /// Replaces any previous connection. Returns whether tools are now
    /// connected. Requires exclusive access, so it cannot race `execute`.
    pub async fn setup_tools(
        &mut self,
        connector: &ToolServerConnector,
        servers: &ToolServerSet,
    ) -> bool {
        self.tool_connection = connector.setup(servers).await;
        self.tool_connection.is_some()
    }

    /// Advertised capability tags. Depends only on construction-time state.
    pub fn capabilities(&self) -> Vec<String> {
        let mut capabilities: Vec<String> =
            BASE_CAPABILITIES.iter().map(|c| (*c).to_string()).collect();
        if self.tool_connection.is_some() {
            capabilities.push(TOOLS_CAPABILITY.to_string());
        }
        for tag in &self.capability_tags {
            if !capabilities.contains(tag) {
                capabilities.push(tag.clone());
            }
        }
        capabilities
    }

    /// Build the `[system, user]` message pair, grounding the user message
    /// when the variant has a grounding source
    pub async fn build_context(&self, prompt: &str) -> BuiltContext {
        let system = Message::system(self.system_prompt.clone());

        let Some(grounding) = &self.grounding else {
            return BuiltContext {
                messages: vec![system, Message::user(prompt)],
                grounded_records: None,
            };
        };

        let snapshot = Self::fetch_grounding(grounding.as_ref()).await;
        let user = format!(
            "{}\n\nIMPORTANT: {}\n\nUser question: {}",
            snapshot.block,
            grounding.scope_instruction(),
            prompt
        );

        BuiltContext {
            messages: vec![system, Message::user(user)],
            grounded_records: Some(snapshot.record_count),
        }
    }

    async fn fetch_grounding(grounding: &dyn GroundingSource) -> GroundingSnapshot {
        match grounding.snapshot().await {
            Ok(snapshot) if snapshot.record_count > 0 => snapshot,
            Ok(_) => grounding.placeholder(),
            Err(e) => {
                tracing::warn!(error = %e, "Grounding fetch failed, using placeholder");
                grounding.placeholder()
            }
        }
    }

    /// Tools to bind: only when requested, connected, and non-empty
    fn bound_tools(&self, use_tools: bool) -> Option<&[RemoteTool]> {
        if !use_tools {
            return None;
        }
        self.tool_connection
            .as_ref()
            .map(ToolConnection::tools)
            .filter(|tools| !tools.is_empty())
    }

    /// Run the pipeline. Never fails; errors land in the envelope.
    pub async fn execute(&self, prompt: &str, use_tools: bool) -> ExecutionResult {
        match self.try_execute(prompt, use_tools).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(agent = %self.kind, error = %e, "Error executing agent");
                ExecutionResult::failure(e.to_string())
            }
        }
    }

    async fn try_execute(&self, prompt: &str, use_tools: bool) -> Result<ExecutionResult> {
        let context = self.build_context(prompt).await;
        let tools = self.bound_tools(use_tools);

        tracing::debug!(
            agent = %self.kind,
            provider = self.provider.name(),
            tools = tools.map_or(0, <[RemoteTool]>::len),
            "Invoking backend"
        );

        let completion = self
            .provider
            .complete(&context.messages, &self.options, tools)
            .await?;

        let mut metadata = Map::new();
        metadata.insert(META_MODEL.into(), Value::from(self.configuration.model()));
        metadata.insert(
            META_TOOLS_USED.into(),
            Value::from(tools.map_or(0, <[RemoteTool]>::len)),
        );
        if let Some(count) = context.grounded_records {
            metadata.insert(META_GROUNDED_RECORDS.into(), Value::from(count));
        }

        Ok(ExecutionResult::success(completion.content, metadata))
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    configuration: AgentConfiguration,
    kind: AgentKind,
    system_prompt: String,
    provider: Option<Arc<dyn LlmProvider>>,
    grounding: Option<Arc<dyn GroundingSource>>,
    capability_tags: Vec<String>,
}

impl AgentBuilder {
    pub fn new(configuration: AgentConfiguration) -> Self {
        Self {
            configuration,
            kind: AgentKind::Chat,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            provider: None,
            grounding: None,
            capability_tags: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn grounding(mut self, grounding: Arc<dyn GroundingSource>) -> Self {
        self.grounding = Some(grounding);
        self
    }

    #[must_use]
    pub fn capability(mut self, tag: impl Into<String>) -> Self {
        self.capability_tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn capabilities(mut self, tags: Vec<String>) -> Self {
        self.capability_tags.extend(tags);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        tracing::info!(
            agent = %self.kind,
            model = self.configuration.model(),
            "Initialized agent"
        );

        Ok(Agent {
            kind: self.kind,
            options: GenerationOptions::for_model(self.configuration.model()),
            configuration: self.configuration,
            system_prompt: self.system_prompt,
            provider,
            tool_connection: None,
            grounding: self.grounding,
            capability_tags: self.capability_tags,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::PLACEHOLDER_CREDENTIAL;
    use crate::provider::Completion;
    use crate::tool::tests::StaticToolClient;

    /// What the mock provider saw on one call
    #[derive(Clone, Debug)]
    pub struct SeenCall {
        pub messages: Vec<Message>,
        pub bound_tools: Option<usize>,
    }

    /// Provider answering with fixed text, or failing
    pub struct MockProvider {
        reply: std::result::Result<String, String>,
        pub calls: Mutex<Vec<SeenCall>>,
    }

    impl MockProvider {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: &str) -> Self {
            Self {
                reply: Err(error.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn last_call(&self) -> SeenCall {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
            tools: Option<&[RemoteTool]>,
        ) -> Result<Completion> {
            self.calls.lock().unwrap().push(SeenCall {
                messages: messages.to_vec(),
                bound_tools: tools.map(<[RemoteTool]>::len),
            });
            match &self.reply {
                Ok(text) => Ok(Completion::text(text.clone(), options.model.clone())),
                Err(e) => Err(AgentError::ProviderUnavailable(e.clone())),
            }
        }
    }

    /// Grounding source with a fixed number of records, or failing
    struct CountingGrounding {
        records: Option<usize>,
    }

    #[async_trait]
    impl GroundingSource for CountingGrounding {
        async fn snapshot(&self) -> Result<GroundingSnapshot> {
            let count = self
                .records
                .ok_or_else(|| AgentError::Grounding("store offline".into()))?;
            let block = (1..=count)
                .map(|i| format!("LISTING #{i}"))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(GroundingSnapshot::new(block, count))
        }

        fn placeholder(&self) -> GroundingSnapshot {
            GroundingSnapshot::placeholder("No active listings.")
        }

        fn scope_instruction(&self) -> &'static str {
            "Only reference the listings above."
        }
    }

    fn connector(client: StaticToolClient) -> ToolServerConnector {
        ToolServerConnector::new(Arc::new(client))
    }

    async fn search_agent(
        credential: Option<&str>,
        client: StaticToolClient,
        provider: Arc<MockProvider>,
    ) -> Agent {
        AgentProfile::search(credential)
            .build(AgentConfiguration::default(), provider, &connector(client))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_credential_disables_tools() {
        let provider = Arc::new(MockProvider::replying("hi"));
        for credential in [None, Some(PLACEHOLDER_CREDENTIAL), Some("")] {
            let agent = search_agent(
                credential,
                StaticToolClient::with_tools(&["web_search"]),
                provider.clone(),
            )
            .await;
            assert!(agent.tool_connection().is_none());
            assert!(!agent.capabilities().contains(&TOOLS_CAPABILITY.to_string()));
        }
    }

    #[tokio::test]
    async fn test_valid_credential_enables_tools() {
        let provider = Arc::new(MockProvider::replying("hi"));
        let agent = search_agent(
            Some("team-123"),
            StaticToolClient::with_tools(&["web_search"]),
            provider,
        )
        .await;
        assert!(agent.tool_connection().is_some());
        assert!(agent.capabilities().contains(&TOOLS_CAPABILITY.to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_server_degrades_to_plain() {
        let provider = Arc::new(MockProvider::replying("plain answer"));
        let agent =
            search_agent(Some("team-123"), StaticToolClient::failing(), provider.clone()).await;

        assert!(agent.tool_connection().is_none());
        let result = agent.execute("latest news?", true).await;
        assert!(result.success);
        assert_eq!(result.content, "plain answer");
        assert_eq!(provider.last_call().bound_tools, None);
        assert_eq!(result.metadata_count(META_TOOLS_USED), Some(0));
    }

    #[tokio::test]
    async fn test_tools_bound_when_requested() {
        let provider = Arc::new(MockProvider::replying("found it"));
        let agent = search_agent(
            Some("team-123"),
            StaticToolClient::with_tools(&["web_search", "fetch_page"]),
            provider.clone(),
        )
        .await;

        let result = agent.execute("q", true).await;
        assert!(result.success);
        assert_eq!(result.metadata_count(META_TOOLS_USED), Some(2));
        assert_eq!(provider.last_call().bound_tools, Some(2));
    }

    #[tokio::test]
    async fn test_use_tools_false_never_binds() {
        let provider = Arc::new(MockProvider::replying("ok"));
        let agent = search_agent(
            Some("team-123"),
            StaticToolClient::with_tools(&["web_search", "fetch_page"]),
            provider.clone(),
        )
        .await;

        let result = agent.execute("q", false).await;
        assert!(result.success);
        assert_eq!(provider.last_call().bound_tools, None);
        assert_eq!(result.metadata_count(META_TOOLS_USED), Some(0));
    }

    #[tokio::test]
    async fn test_empty_tool_list_uses_plain_mode() {
        let provider = Arc::new(MockProvider::replying("ok"));
        let tools = StaticToolClient::with_tools(&[]);
        let agent = search_agent(Some("team-123"), tools, provider.clone()).await;

        assert!(agent.tool_connection().is_some());
        let result = agent.execute("q", true).await;
        assert_eq!(provider.last_call().bound_tools, None);
        assert_eq!(result.metadata_count(META_TOOLS_USED), Some(0));
    }

    #[tokio::test]
    async fn test_capabilities_stable() {
        let agent = search_agent(
            Some("team-123"),
            StaticToolClient::with_tools(&["web_search"]),
            Arc::new(MockProvider::replying("ok")),
        )
        .await;
        assert_eq!(agent.capabilities(), agent.capabilities());
        assert_eq!(
            agent.capabilities(),
            vec!["text_generation", "conversation", "mcp_enabled"]
        );
    }

    #[tokio::test]
    async fn test_variant_tags_appended_once() {
        let agent = AgentProfile::chat()
            .with_capabilities(["market_analysis", "conversation", "market_analysis"])
            .build(
                AgentConfiguration::default(),
                Arc::new(MockProvider::replying("ok")),
                &connector(StaticToolClient::failing()),
            )
            .await
            .unwrap();
        assert_eq!(
            agent.capabilities(),
            vec!["text_generation", "conversation", "market_analysis"]
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_contained() {
        let agent = AgentProfile::chat()
            .build(
                AgentConfiguration::default(),
                Arc::new(MockProvider::failing("connection reset")),
                &connector(StaticToolClient::failing()),
            )
            .await
            .unwrap();

        let result = agent.execute("hello", true).await;
        assert!(!result.success);
        assert!(result.content.is_empty());
        let error = result.error.unwrap();
        assert!(!error.is_empty());
        assert!(error.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_plain_messages() {
        let provider = Arc::new(MockProvider::replying("hey"));
        let agent = AgentProfile::chat()
            .build(
                AgentConfiguration::default(),
                provider.clone(),
                &connector(StaticToolClient::failing()),
            )
            .await
            .unwrap();

        let result = agent.execute("hello", true).await;
        assert_eq!(result.metadata.get(META_MODEL), Some(&Value::from("gemini-2.5-pro")));
        assert!(result.metadata.get(META_GROUNDED_RECORDS).is_none());

        let call = provider.last_call();
        assert_eq!(call.messages.len(), 2);
        assert_eq!(call.messages[0].content, CHAT_PROMPT);
        assert_eq!(call.messages[1].content, "hello");
    }

    #[tokio::test]
    async fn test_grounded_count_matches_snapshot() {
        let provider = Arc::new(MockProvider::replying("three homes"));
        let agent = AgentProfile::new(AgentKind::RealEstate, "expert")
            .with_grounding(Arc::new(CountingGrounding { records: Some(3) }))
            .build(
                AgentConfiguration::default(),
                provider.clone(),
                &connector(StaticToolClient::failing()),
            )
            .await
            .unwrap();

        let result = agent.execute("What do you have?", true).await;
        assert!(result.success);
        assert_eq!(result.metadata_count(META_GROUNDED_RECORDS), Some(3));

        let user = &provider.last_call().messages[1].content;
        assert!(user.starts_with("LISTING #1"));
        assert!(user.contains("IMPORTANT: Only reference the listings above."));
        assert!(user.ends_with("User question: What do you have?"));
    }

    #[tokio::test]
    async fn test_grounding_failure_uses_placeholder() {
        let provider = Arc::new(MockProvider::replying("none right now"));
        let agent = AgentProfile::new(AgentKind::RealEstate, "expert")
            .with_grounding(Arc::new(CountingGrounding { records: None }))
            .build(
                AgentConfiguration::default(),
                provider.clone(),
                &connector(StaticToolClient::failing()),
            )
            .await
            .unwrap();

        let result = agent.execute("Anything?", true).await;
        assert!(result.success);
        assert_eq!(result.metadata_count(META_GROUNDED_RECORDS), Some(0));
        assert!(provider.last_call().messages[1].content.starts_with("No active listings."));
    }

    #[tokio::test]
    async fn test_explicit_setup_populates_connection() {
        let mut agent = AgentProfile::chat()
            .build(
                AgentConfiguration::default(),
                Arc::new(MockProvider::replying("ok")),
                &connector(StaticToolClient::failing()),
            )
            .await
            .unwrap();
        assert!(agent.tool_connection().is_none());

        let connected = agent
            .setup_tools(
                &connector(StaticToolClient::with_tools(&["web_search"])),
                &ToolServerSet::web_search("team-123"),
            )
            .await;
        assert!(connected);
        assert!(agent.capabilities().contains(&TOOLS_CAPABILITY.to_string()));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(AgentKind::parse("real_estate"), Some(AgentKind::RealEstate));
        assert_eq!(AgentKind::parse("unknown"), None);
        assert_eq!(AgentKind::from_request("unknown"), AgentKind::Chat);
        assert_eq!(AgentKind::from_request("search"), AgentKind::Search);
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = Agent::builder(AgentConfiguration::default()).build().err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
