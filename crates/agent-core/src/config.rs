//! Configuration Resolution
//!
//! Resolves the LLM backend endpoint, model and credential, plus the
//! tool-server gating credential. Every field falls through
//! override → source value → default, so resolution never fails.
//!
//! | field           | key                       | default            |
//! |-----------------|---------------------------|--------------------|
//! | endpoint        | `LITELLM_BASE_URL`        | [`DEFAULT_ENDPOINT`] |
//! | model           | `AI_MODEL_NAME`           | [`DEFAULT_MODEL`]  |
//! | credential      | `LITELLM_AUTH_TOKEN`      | [`PLACEHOLDER_CREDENTIAL`] |
//! | tool credential | `CODEXHUB_MCP_AUTH_TOKEN` | none (tools disabled) |

use std::collections::HashMap;

use serde::Serialize;

pub const ENDPOINT_KEY: &str = "LITELLM_BASE_URL";
pub const MODEL_KEY: &str = "AI_MODEL_NAME";
pub const CREDENTIAL_KEY: &str = "LITELLM_AUTH_TOKEN";
pub const TOOL_CREDENTIAL_KEY: &str = "CODEXHUB_MCP_AUTH_TOKEN";

pub const DEFAULT_ENDPOINT: &str = "https://litellm-docker-545630944929.us-central1.run.app";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Stand-in credential used when none is configured.
///
/// Components that see it treat the capability as disabled, not as an error.
pub const PLACEHOLDER_CREDENTIAL: &str = "dummy-key";

/// Returns true for the placeholder sentinel.
pub fn is_placeholder(credential: &str) -> bool {
    credential == PLACEHOLDER_CREDENTIAL
}

/// Resolved LLM backend configuration. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentConfiguration {
    endpoint_url: String,
    model: String,
    #[serde(skip_serializing)]
    credential: String,
}

impl AgentConfiguration {
    pub fn new(
        endpoint_url: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            model: model.into(),
            credential: credential.into(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Whether the backend credential is the placeholder sentinel
    pub fn has_placeholder_credential(&self) -> bool {
        is_placeholder(&self.credential)
    }
}

impl Default for AgentConfiguration {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, PLACEHOLDER_CREDENTIAL)
    }
}

/// Where configuration values come from
pub trait ConfigSource: Send + Sync {
    /// Look up a value; `None` when unset
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Explicit values that win over the source
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub endpoint_url: Option<String>,
    pub model: Option<String>,
    pub credential: Option<String>,
    pub tool_credential: Option<String>,
}

/// Resolves [`AgentConfiguration`] and the tool gating credential
pub struct ConfigResolver<S = EnvSource> {
    source: S,
    overrides: ConfigOverrides,
}

impl ConfigResolver<EnvSource> {
    /// Resolver over the process environment
    pub fn from_env() -> Self {
        Self::new(EnvSource)
    }
}

impl<S: ConfigSource> ConfigResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            overrides: ConfigOverrides::default(),
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Resolve the backend configuration. Never fails.
    pub fn resolve(&self) -> AgentConfiguration {
        let endpoint_url = self.field(
            self.overrides.endpoint_url.as_ref(),
            ENDPOINT_KEY,
            DEFAULT_ENDPOINT,
        );
        let model = self.field(self.overrides.model.as_ref(), MODEL_KEY, DEFAULT_MODEL);
        let credential = self.field(
            self.overrides.credential.as_ref(),
            CREDENTIAL_KEY,
            PLACEHOLDER_CREDENTIAL,
        );

        if is_placeholder(&credential) {
            tracing::debug!("{} not set, using placeholder credential", CREDENTIAL_KEY);
        }

        AgentConfiguration {
            endpoint_url,
            model,
            credential,
        }
    }

    /// Resolve the tool-server gating credential.
    ///
    /// `None` when unset, empty, or the placeholder sentinel.
    pub fn resolve_tool_credential(&self) -> Option<String> {
        self.lookup(self.overrides.tool_credential.as_ref(), TOOL_CREDENTIAL_KEY)
            .filter(|token| !is_placeholder(token))
    }

    fn field(&self, explicit: Option<&String>, key: &str, default: &str) -> String {
        self.lookup(explicit, key).unwrap_or_else(|| default.to_string())
    }

    fn lookup(&self, explicit: Option<&String>, key: &str) -> Option<String> {
        explicit
            .cloned()
            .or_else(|| self.source.get(key))
            .filter(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_only() {
        let config = ConfigResolver::new(source(&[])).resolve();
        assert_eq!(config.endpoint_url(), DEFAULT_ENDPOINT);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.credential(), PLACEHOLDER_CREDENTIAL);
        assert!(config.has_placeholder_credential());
        assert_eq!(config, AgentConfiguration::default());
    }

    #[test]
    fn test_source_values_win_over_defaults() {
        let resolver = ConfigResolver::new(source(&[
            (ENDPOINT_KEY, "http://localhost:4000"),
            (MODEL_KEY, "gpt-4o-mini"),
            (CREDENTIAL_KEY, "sk-live"),
        ]));
        let config = resolver.resolve();
        assert_eq!(config.endpoint_url(), "http://localhost:4000");
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.credential(), "sk-live");
        assert!(!config.has_placeholder_credential());
    }

    #[test]
    fn test_overrides_win_over_source() {
        let resolver = ConfigResolver::new(source(&[(MODEL_KEY, "from-env")])).with_overrides(
            ConfigOverrides {
                model: Some("explicit".into()),
                ..Default::default()
            },
        );
        assert_eq!(resolver.resolve().model(), "explicit");
    }

    #[test]
    fn test_empty_value_falls_through() {
        let config = ConfigResolver::new(source(&[(ENDPOINT_KEY, "  ")])).resolve();
        assert_eq!(config.endpoint_url(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_tool_credential_gating() {
        assert_eq!(ConfigResolver::new(source(&[])).resolve_tool_credential(), None);
        assert_eq!(
            ConfigResolver::new(source(&[(TOOL_CREDENTIAL_KEY, PLACEHOLDER_CREDENTIAL)]))
                .resolve_tool_credential(),
            None
        );
        assert_eq!(
            ConfigResolver::new(source(&[(TOOL_CREDENTIAL_KEY, "team-123")]))
                .resolve_tool_credential()
                .as_deref(),
            Some("team-123")
        );
    }

    #[test]
    fn test_credential_not_serialized() {
        let config = AgentConfiguration::new("http://x", "m", "secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
