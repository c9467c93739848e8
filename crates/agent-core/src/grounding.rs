//! Grounding
//!
//! Authoritative context fetched fresh for every grounded execution and
//! injected ahead of the user prompt.

use async_trait::async_trait;

use crate::error::Result;

/// Rendered grounding context plus the number of records it contains
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroundingSnapshot {
    /// Text block placed before the user question
    pub block: String,

    /// Records actually rendered into `block`
    pub record_count: usize,
}

impl GroundingSnapshot {
    pub fn new(block: impl Into<String>, record_count: usize) -> Self {
        Self {
            block: block.into(),
            record_count,
        }
    }

    /// Stand-in used when no records are available
    pub fn placeholder(block: impl Into<String>) -> Self {
        Self::new(block, 0)
    }
}

/// Source of grounding context.
///
/// Implementations must query on every call; snapshots are never cached.
#[async_trait]
pub trait GroundingSource: Send + Sync {
    /// Fetch and render a fresh snapshot
    async fn snapshot(&self) -> Result<GroundingSnapshot>;

    /// Block used when the snapshot is empty or cannot be fetched
    fn placeholder(&self) -> GroundingSnapshot;

    /// Instruction appended after the block to keep answers in scope
    fn scope_instruction(&self) -> &str;
}
