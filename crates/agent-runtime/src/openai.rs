//! OpenAI-compatible LLM Provider
//!
//! Implementation of `LlmProvider` for `/chat/completions` endpoints
//! (LiteLLM proxy, OpenAI, vLLM, ...).

use std::time::Duration;

use agent_core::{
    config::AgentConfiguration,
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
    tool::RemoteTool,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// OpenAI-compatible provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API base, ending before `/chat/completions`
    pub base_url: String,

    /// Bearer credential
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn from_configuration(configuration: &AgentConfiguration) -> Self {
        Self {
            base_url: configuration.endpoint_url().to_string(),
            api_key: configuration.credential().to_string(),
            timeout_secs: 120,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    chat_url: String,
    api_key: String,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            chat_url: config.chat_url(),
            api_key: config.api_key.clone(),
        })
    }

    /// Create from a resolved agent configuration
    pub fn from_configuration(configuration: &AgentConfiguration) -> Result<Self> {
        Self::from_config(&OpenAiConfig::from_configuration(configuration))
    }

    /// Build the request body
    fn build_request(
        messages: &[Message],
        options: &GenerationOptions,
        tools: Option<&[RemoteTool]>,
    ) -> ChatRequest {
        ChatRequest {
            model: options.model.clone(),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools: tools.map(|tools| tools.iter().map(function_declaration).collect()),
        }
    }

    /// Convert the wire response to a completion
    fn convert_completion(response: ChatResponse, fallback_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("response contained no choices".into()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or_else(|| fallback_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_wire),
        })
    }
}

/// Map a non-success status to an error
fn classify_status(status: StatusCode, body: &str) -> AgentError {
    let detail = format!("{status}: {}", body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

fn function_declaration(tool: &RemoteTool) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        tools: Option<&[RemoteTool]>,
    ) -> Result<Completion> {
        let request = Self::build_request(messages, options, tools);

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid response body: {e}")))?;

        Self::convert_completion(body, &options.model)
    }
}
