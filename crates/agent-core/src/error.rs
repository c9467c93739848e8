//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM backend rejected or failed the request
    #[error("Provider error: {0}")]
    Provider(String),

    /// Backend unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Backend quota or rate limit hit
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Credential rejected by the backend
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Tool server unreachable, rejected auth, or answered with an error
    #[error("Tool server error: {0}")]
    ToolServer(String),

    /// Tool server descriptor cannot be used as given
    #[error("Malformed tool server descriptor: {0}")]
    MalformedDescriptor(String),

    /// Grounding data could not be fetched
    #[error("Grounding unavailable: {0}")]
    Grounding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            Self::ToolServer(_) | Self::MalformedDescriptor(_) => {
                "External tools are currently unavailable.".into()
            }
            Self::Grounding(_) => "Listing data is currently unavailable.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
