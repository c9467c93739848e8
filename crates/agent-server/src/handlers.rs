//! HTTP Handlers
//!
//! Agent routes always answer 200 with an envelope; failures are reported
//! through `success = false` and `error`. Only the property routes use
//! HTTP status codes for errors.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use agent_core::{AgentKind, result::META_TOOLS_USED};
use real_estate::{
    Listing, ListingError, ListingFilter, ListingStatus, ListingStore, ListingUpdate, PropertyType,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub web_search_configured: bool,
    pub agents_ready: Vec<AgentKind>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default = "default_use_tools")]
    pub use_tools: bool,
}

fn default_agent_type() -> String {
    AgentKind::Chat.as_str().to_string()
}

const fn default_use_tools() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub agent_type: AgentKind,
    pub capabilities: Vec<String>,
    pub metadata: Map<String, Value>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

const fn default_max_results() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub summary: String,
    pub search_results: Option<Map<String, Value>>,
    pub sources_count: u64,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CapabilitiesResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn listing_error(err: &ListingError) -> ApiError {
    let (status, code) = match err {
        ListingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ListingError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_LISTING"),
        ListingError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.into(),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub status: ListingStatus,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub bedrooms: Option<u32>,
    #[serde(default = "default_listing_limit")]
    pub limit: usize,
}

const fn default_listing_limit() -> usize {
    100
}

impl ListingQuery {
    fn filter(&self) -> ListingFilter {
        ListingFilter {
            status: Some(self.status),
            property_type: self.property_type,
            min_price: self.min_price,
            max_price: self.max_price,
            bedrooms: self.bedrooms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub location: String,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: u32,
    pub property_type: PropertyType,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub year_built: Option<u32>,
    pub garage: Option<u32>,
    pub lot_size: Option<Decimal>,
    pub mls_number: Option<String>,
}

impl CreateListingRequest {
    fn into_listing(self) -> Listing {
        let mut listing = Listing::new(self.title, self.price, self.property_type)
            .located(self.location, self.address)
            .rooms(self.bedrooms, self.bathrooms, self.sqft)
            .described(self.description)
            .with_amenities(self.amenities);
        listing.image_url = self.image_url;
        listing.year_built = self.year_built;
        listing.garage = self.garage;
        listing.lot_size = self.lot_size;
        listing.mls_number = self.mls_number;
        listing
    }
}

// ============================================================================
// Agent Handlers
// ============================================================================

pub async fn root() -> Json<Value> {
    Json(serde_json::json!({ "message": "Hello World" }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: state.factory.configuration.model().to_string(),
        web_search_configured: state.factory.tool_credential.is_some(),
        agents_ready: state.registry.initialized(),
    })
}

/// Run one prompt through the requested agent
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let kind = AgentKind::from_request(&payload.agent_type);
    if kind.as_str() != payload.agent_type.trim() {
        tracing::debug!(requested = %payload.agent_type, "Unknown agent type, using chat");
    }

    let agent = match state.agent(kind).await {
        Ok(agent) => agent,
        Err(e) => {
            tracing::error!(agent = %kind, error = %e, "Failed to initialize agent");
            return Json(ChatResponse {
                success: false,
                response: String::new(),
                agent_type: kind,
                capabilities: Vec::new(),
                metadata: Map::new(),
                error: Some(e.user_message()),
            });
        }
    };

    let result = agent.execute(&payload.message, payload.use_tools).await;

    Json(ChatResponse {
        success: result.success,
        response: result.content,
        agent_type: kind,
        capabilities: agent.capabilities(),
        metadata: result.metadata,
        error: result.error,
    })
}

/// Research prompt for the search route
pub fn search_prompt(query: &str) -> String {
    format!(
        "Search for information about: {query}. Provide a comprehensive summary with key findings."
    )
}

/// Web search with an AI summary
pub async fn search_handler(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Json<SearchResponse> {
    tracing::debug!(query = %payload.query, max_results = payload.max_results, "Search request");

    let failed = |query: String, error: String| SearchResponse {
        success: false,
        query,
        summary: String::new(),
        search_results: None,
        sources_count: 0,
        error: Some(error),
    };

    let agent = match state.agent(AgentKind::Search).await {
        Ok(agent) => agent,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize search agent");
            return Json(failed(payload.query, e.user_message()));
        }
    };

    let result = agent.execute(&search_prompt(&payload.query), true).await;
    if !result.success {
        let error = result.error.unwrap_or_default();
        return Json(failed(payload.query, error));
    }

    let sources_count = result.metadata_count(META_TOOLS_USED).unwrap_or(0);
    Json(SearchResponse {
        success: true,
        query: payload.query,
        summary: result.content,
        search_results: Some(result.metadata),
        sources_count,
        error: None,
    })
}

/// Capabilities of every agent kind, served from the shared agents
pub async fn capabilities_handler(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    let agents = join_all(AgentKind::ALL.into_iter().map(|kind| {
        let state = state.clone();
        async move { (kind, state.agent(kind).await) }
    }))
    .await;

    let mut capabilities = BTreeMap::new();
    for (kind, agent) in agents {
        match agent {
            Ok(agent) => {
                capabilities.insert(format!("{kind}_agent"), agent.capabilities());
            }
            Err(e) => {
                tracing::error!(agent = %kind, error = %e, "Error getting capabilities");
                return Json(CapabilitiesResponse {
                    success: false,
                    capabilities: None,
                    error: Some(e.user_message()),
                });
            }
        }
    }

    Json(CapabilitiesResponse {
        success: true,
        capabilities: Some(capabilities),
        error: None,
    })
}

// ============================================================================
// Property Handlers
// ============================================================================

pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let listings = state
        .listings
        .query(&query.filter(), query.limit)
        .await
        .map_err(|e| listing_error(&e))?;
    Ok(Json(listings))
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    state
        .listings
        .get(&id)
        .await
        .map(Json)
        .map_err(|e| listing_error(&e))
}

pub async fn create_property(
    State(state): State<AppState>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let listing = payload.into_listing();
    state
        .listings
        .insert(listing.clone())
        .await
        .map_err(|e| listing_error(&e))?;
    tracing::info!(id = %listing.id, title = %listing.title, "Listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ListingUpdate>,
) -> Result<Json<Listing>, ApiError> {
    let updated = state
        .listings
        .update(&id, payload)
        .await
        .map_err(|e| listing_error(&e))?;
    tracing::info!(id = %updated.id, status = ?updated.status, "Listing updated");
    Ok(Json(updated))
}

pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.listings.remove(&id).await.map_err(|e| listing_error(&e))?;
    tracing::info!(id = %removed.id, "Listing deleted");
    Ok(Json(serde_json::json!({ "message": "Property deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use agent_core::provider::{Completion, GenerationOptions};
    use agent_core::{
        AgentConfiguration, AgentError, LlmProvider, Message, RemoteTool, ToolServerClient,
        ToolServerConnector, ToolServerSet,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use real_estate::MemoryListingStore;
    use tower::ServiceExt;

    use super::*;
    use crate::router;
    use crate::state::AgentFactory;

    struct CannedProvider {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
            tools: Option<&[RemoteTool]>,
        ) -> agent_core::Result<Completion> {
            if self.fail {
                return Err(AgentError::ProviderUnavailable("backend down".into()));
            }
            let count = tools.map_or(0, <[RemoteTool]>::len);
            Ok(Completion::text(format!("answer using {count} tools"), &options.model))
        }
    }

    struct TwoTools {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolServerClient for TwoTools {
        async fn list_tools(&self, servers: &ToolServerSet) -> agent_core::Result<Vec<RemoteTool>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let server = servers.servers()[0].url.clone();
            Ok(["web_search", "fetch_page"]
                .into_iter()
                .map(|name| RemoteTool {
                    name: name.into(),
                    description: String::new(),
                    input_schema: serde_json::json!({"type": "object"}),
                    server: server.clone(),
                })
                .collect())
        }
    }

    fn state(fail: bool, tool_credential: Option<&str>) -> (AppState, Arc<TwoTools>) {
        let client = Arc::new(TwoTools {
            calls: AtomicUsize::new(0),
        });
        let listings = Arc::new(MemoryListingStore::sample());
        let factory = AgentFactory {
            configuration: AgentConfiguration::default(),
            tool_credential: tool_credential.map(str::to_string),
            provider: Arc::new(CannedProvider { fail }),
            connector: ToolServerConnector::new(client.clone()),
            listings: listings.clone(),
        };
        (AppState::new(factory, listings), client)
    }

    async fn call(
        state: AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router(state)
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[test]
    fn test_request_defaults() {
        let chat: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(chat.agent_type, "chat");
        assert!(chat.use_tools);

        let search: SearchRequest = serde_json::from_str(r#"{"query": "rates"}"#).unwrap();
        assert_eq!(search.max_results, 5);
    }

    #[test]
    fn test_search_prompt() {
        assert_eq!(
            search_prompt("mortgage rates"),
            "Search for information about: mortgage rates. Provide a comprehensive summary with key findings."
        );
    }

    #[tokio::test]
    async fn test_chat_unknown_type_uses_chat() {
        let (state, _) = state(false, None);
        let (status, body) = call(
            state,
            Method::POST,
            "/api/chat",
            Some(serde_json::json!({"message": "hello", "agent_type": "poet"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["agent_type"], "chat");
        assert_eq!(body["response"], "answer using 0 tools");
        assert_eq!(body["metadata"]["tools_used"], 0);
        assert_eq!(body["capabilities"], serde_json::json!(["text_generation", "conversation"]));
    }

    #[tokio::test]
    async fn test_real_estate_chat_is_grounded() {
        let (state, _) = state(false, None);
        let (_, body) = call(
            state,
            Method::POST,
            "/api/chat",
            Some(serde_json::json!({
                "message": "Show me 2-bedroom options",
                "agent_type": "real_estate"
            })),
        )
        .await;

        assert_eq!(body["success"], true);
        assert_eq!(body["metadata"]["grounded_records"], 6);
    }

    #[tokio::test]
    async fn test_sold_listing_leaves_grounding() {
        let (state, _) = state(false, None);
        let question = serde_json::json!({
            "message": "Any condos downtown?",
            "agent_type": "real_estate"
        });

        // Build the agent first so the cached instance must see the change
        let (_, body) =
            call(state.clone(), Method::POST, "/api/chat", Some(question.clone())).await;
        assert_eq!(body["metadata"]["grounded_records"], 6);

        let (_, listings) = call(state.clone(), Method::GET, "/api/properties", None).await;
        let id = listings[1]["id"].as_str().unwrap().to_string();

        let (status, updated) = call(
            state.clone(),
            Method::PUT,
            &format!("/api/properties/{id}"),
            Some(serde_json::json!({"status": "sold"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "sold");
        assert_eq!(updated["title"], "Downtown Penthouse");

        let (_, body) = call(state, Method::POST, "/api/chat", Some(question)).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["metadata"]["grounded_records"], 5);
    }

    #[tokio::test]
    async fn test_update_unknown_property_is_not_found() {
        let (state, _) = state(false, None);
        let (status, body) = call(
            state,
            Method::PUT,
            "/api/properties/no-such-id",
            Some(serde_json::json!({"price": 500000})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_backend_failure_is_envelope() {
        let (state, _) = state(true, None);
        let (status, body) = call(
            state,
            Method::POST,
            "/api/chat",
            Some(serde_json::json!({"message": "hello"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["response"], "");
        assert!(body["error"].as_str().unwrap().contains("backend down"));
    }

    #[tokio::test]
    async fn test_search_counts_sources() {
        let (state, _) = state(false, Some("team-key"));
        let (_, body) = call(
            state,
            Method::POST,
            "/api/search",
            Some(serde_json::json!({"query": "Austin housing market"})),
        )
        .await;

        assert_eq!(body["success"], true);
        assert_eq!(body["query"], "Austin housing market");
        assert_eq!(body["sources_count"], 2);
        assert_eq!(body["summary"], "answer using 2 tools");
    }

    #[tokio::test]
    async fn test_search_without_credential_has_no_sources() {
        let (state, client) = state(false, None);
        let (_, body) = call(
            state,
            Method::POST,
            "/api/search",
            Some(serde_json::json!({"query": "rates"})),
        )
        .await;

        assert_eq!(body["success"], true);
        assert_eq!(body["sources_count"], 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_capabilities_reuse_registry() {
        let (state, client) = state(false, Some("team-key"));

        let (_, body) = call(state.clone(), Method::GET, "/api/agents/capabilities", None).await;
        assert_eq!(body["success"], true);
        let caps = &body["capabilities"];
        assert!(caps["search_agent"].as_array().unwrap().contains(&Value::from("mcp_enabled")));
        assert!(caps["real_estate_agent"]
            .as_array()
            .unwrap()
            .contains(&Value::from("property_valuation")));
        assert!(!caps["chat_agent"].as_array().unwrap().contains(&Value::from("mcp_enabled")));

        // Second call builds nothing new
        call(state.clone(), Method::GET, "/api/agents/capabilities", None).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.registry.initialized().len(), 3);
    }

    #[tokio::test]
    async fn test_property_routes() {
        let (state, _) = state(false, None);

        let (status, body) = call(
            state.clone(),
            Method::GET,
            "/api/properties?property_type=condo&max_price=1000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Urban Loft");

        let (status, created) = call(
            state.clone(),
            Method::POST,
            "/api/properties",
            Some(serde_json::json!({
                "title": "Garden Cottage",
                "price": 410000,
                "location": "Portland, OR",
                "address": "12 Alder St, Portland, OR 97205",
                "bedrooms": 2,
                "bathrooms": 1,
                "sqft": 1100,
                "property_type": "house"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) =
            call(state.clone(), Method::GET, &format!("/api/properties/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Garden Cottage");

        let (status, _) =
            call(state.clone(), Method::DELETE, &format!("/api/properties/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(state, Method::GET, &format!("/api/properties/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
