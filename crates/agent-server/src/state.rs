//! Application State

use std::sync::Arc;

use agent_core::{
    Agent, AgentConfiguration, AgentKind, AgentProfile, AgentRegistry, LlmProvider, Result,
    ToolServerConnector,
};
use real_estate::{ListingStore, MemoryListingStore, real_estate_profile};

/// Everything needed to construct an agent of any kind
pub struct AgentFactory {
    pub configuration: AgentConfiguration,

    /// Web-search credential; `None` disables tools
    pub tool_credential: Option<String>,
    pub provider: Arc<dyn LlmProvider>,
    pub connector: ToolServerConnector,
    pub listings: Arc<dyn ListingStore>,
}

impl AgentFactory {
    fn profile(&self, kind: AgentKind) -> AgentProfile {
        let credential = self.tool_credential.as_deref();
        match kind {
            AgentKind::Chat => AgentProfile::chat(),
            AgentKind::Search => AgentProfile::search(credential),
            AgentKind::RealEstate => real_estate_profile(self.listings.clone(), credential),
        }
    }

    pub async fn build(&self, kind: AgentKind) -> Result<Agent> {
        self.profile(kind)
            .build(
                self.configuration.clone(),
                self.provider.clone(),
                &self.connector,
            )
            .await
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Lazily constructed agents, one per kind
    pub registry: Arc<AgentRegistry>,
    pub factory: Arc<AgentFactory>,

    /// Listing catalog behind the property routes and grounding
    pub listings: Arc<MemoryListingStore>,
}

impl AppState {
    pub fn new(factory: AgentFactory, listings: Arc<MemoryListingStore>) -> Self {
        Self {
            registry: Arc::new(AgentRegistry::new()),
            factory: Arc::new(factory),
            listings,
        }
    }

    /// The process-wide agent for `kind`, built on first use
    pub async fn agent(&self, kind: AgentKind) -> Result<Arc<Agent>> {
        self.registry
            .get_or_init(kind, || self.factory.build(kind))
            .await
    }
}
