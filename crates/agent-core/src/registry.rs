//! Agent Registry
//!
//! Process-wide agents keyed by [`AgentKind`], constructed lazily on first
//! use. Each kind has its own once-cell, so concurrent first requests for the
//! same kind build (and set up tools for) exactly one agent, while different
//! kinds never wait on each other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::agent::{Agent, AgentKind};
use crate::error::Result;

pub struct AgentRegistry {
    cells: HashMap<AgentKind, OnceCell<Arc<Agent>>>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            cells: AgentKind::ALL
                .into_iter()
                .map(|kind| (kind, OnceCell::new()))
                .collect(),
        }
    }

    /// Get the agent for `kind`, running `init` if it does not exist yet.
    ///
    /// Concurrent callers wait for the first construction. A failed
    /// construction leaves the slot empty for the next caller.
    pub async fn get_or_init<F, Fut>(&self, kind: AgentKind, init: F) -> Result<Arc<Agent>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Agent>>,
    {
        let cell = &self.cells[&kind];
        let agent = cell
            .get_or_try_init(|| async {
                tracing::info!(agent = %kind, "Constructing agent on first use");
                init().await.map(Arc::new)
            })
            .await?;
        Ok(agent.clone())
    }

    /// The agent for `kind`, if already constructed
    pub fn get(&self, kind: AgentKind) -> Option<Arc<Agent>> {
        self.cells.get(&kind).and_then(OnceCell::get).cloned()
    }

    /// Kinds constructed so far
    pub fn initialized(&self) -> Vec<AgentKind> {
        AgentKind::ALL
            .into_iter()
            .filter(|kind| self.cells[kind].initialized())
            .collect()
    }
}
