//! # real-estate
//!
//! Real-estate assistant grounded on active property listings.
//!
//! Every execution pulls a fresh snapshot of active listings from a
//! [`ListingStore`] and places it ahead of the user's question, so the
//! model recommends real inventory instead of inventing it.
//!
//! ```text
//! ┌──────────────┐   query(active, 50)   ┌──────────────────┐
//! │ ListingStore │ ────────────────────▶ │ ListingGrounding │
//! └──────────────┘                       └────────┬─────────┘
//!                                                 │ snapshot
//!                                                 ▼
//!   [system: REAL_ESTATE_PROMPT]
//!   [user:   LISTINGS (n) + IMPORTANT: scope + User question]
//! ```

pub mod error;
pub mod grounding;
pub mod model;
pub mod store;

use std::sync::Arc;

use agent_core::{AgentKind, AgentProfile, agent::gated_web_search};

pub use error::{ListingError, Result};
pub use grounding::ListingGrounding;
pub use model::{Listing, ListingStatus, ListingUpdate, PropertyType, format_price};
pub use store::{ListingFilter, ListingStore, MemoryListingStore};

/// System prompt for the real-estate agent
pub const REAL_ESTATE_PROMPT: &str = r"You are an expert real estate assistant with extensive knowledge of the property market.
Your role is to help users with:
- Property buying and selling advice
- Market analysis and trends
- Neighborhood information and amenities
- Property valuation insights
- Investment opportunities
- Mortgage and financing guidance
- Home inspection tips
- Legal considerations in real estate

Always be professional, knowledgeable, and helpful. Provide accurate, up-to-date information while being clear about when users should consult with licensed professionals for specific legal or financial advice.
Keep responses conversational and engaging while maintaining expertise.";

/// Capability tags added on top of the base set
pub const REAL_ESTATE_CAPABILITIES: [&str; 5] = [
    "real_estate_expertise",
    "market_analysis",
    "property_valuation",
    "investment_advice",
    "neighborhood_insights",
];

/// Profile for the grounded real-estate agent.
///
/// Web search is attached only when `tool_credential` is usable.
pub fn real_estate_profile(
    store: Arc<dyn ListingStore>,
    tool_credential: Option<&str>,
) -> AgentProfile {
    AgentProfile::new(AgentKind::RealEstate, REAL_ESTATE_PROMPT)
        .with_tool_servers(gated_web_search(AgentKind::RealEstate, tool_credential))
        .with_grounding(Arc::new(ListingGrounding::new(store)))
        .with_capabilities(REAL_ESTATE_CAPABILITIES)
}
