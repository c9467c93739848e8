//! Error Types for Listings

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ListingError>;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Listing store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Invalid listing: {0}")]
    Invalid(String),
}

impl From<ListingError> for agent_core::AgentError {
    fn from(err: ListingError) -> Self {
        Self::Grounding(err.to_string())
    }
}
