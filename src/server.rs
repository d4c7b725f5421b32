//! HTTP boundary layer.
//!
//! Thin axum wrapper over the resolvers and the exporter. Validation of the
//! caller-supplied object type happens here; the core never sees an invalid
//! one.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use hublex_core::api::CrmApi;
use hublex_core::encyclopedia::Exporter;
use hublex_core::hierarchical::HierarchicalResolver;
use hublex_core::resolver::QueryResolver;
use hublex_core::types::ObjectType;

/// Shared handler state. One resolver pair and one exporter over the same
/// collaborator.
pub struct AppState<C> {
    pub resolver: Arc<QueryResolver<C>>,
    pub hierarchical: Arc<HierarchicalResolver<C>>,
    pub exporter: Arc<Exporter<C>>,
    pub default_limit: usize,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            hierarchical: self.hierarchical.clone(),
            exporter: self.exporter.clone(),
            default_limit: self.default_limit,
        }
    }
}

pub fn router<C: CrmApi + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/search/encyclopedia", post(search_encyclopedia::<C>))
        .route("/search/hierarchical", post(search_hierarchical::<C>))
        .route("/encyclopedia/mappings/{object_type}", get(mappings::<C>))
        .route(
            "/encyclopedia/search-mappings/{object_type}",
            get(search_mappings::<C>),
        )
        .route("/encyclopedia/refresh", post(refresh::<C>))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchRequest {
    object_type: String,
    query: String,
    limit: Option<usize>,
    user_email: Option<String>,
}

#[derive(Deserialize)]
struct RefreshRequest {
    object_type: Option<String>,
}

#[derive(Deserialize)]
struct SearchMappingsParams {
    term: String,
}

fn bad_object_type(raw: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": format!(
                "invalid object type '{raw}', expected one of: companies, contacts, deals, tickets"
            )
        })),
    )
        .into_response()
}

fn parse_object_type(raw: &str) -> Result<ObjectType, Response> {
    ObjectType::parse(raw).ok_or_else(|| bad_object_type(raw))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "hublex",
        "endpoints": [
            "/health",
            "/search/encyclopedia",
            "/search/hierarchical",
            "/encyclopedia/mappings/{object_type}",
            "/encyclopedia/search-mappings/{object_type}",
            "/encyclopedia/refresh",
        ],
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn search_encyclopedia<C: CrmApi>(
    State(state): State<AppState<C>>,
    Json(req): Json<SearchRequest>,
) -> Response {
    let object_type = match parse_object_type(&req.object_type) {
        Ok(ot) => ot,
        Err(resp) => return resp,
    };
    let resolved = state
        .resolver
        .resolve_and_search(
            object_type,
            &req.query,
            req.limit.unwrap_or(state.default_limit),
            req.user_email.as_deref(),
        )
        .await;
    Json(resolved).into_response()
}

async fn search_hierarchical<C: CrmApi>(
    State(state): State<AppState<C>>,
    Json(req): Json<SearchRequest>,
) -> Response {
    let object_type = match parse_object_type(&req.object_type) {
        Ok(ot) => ot,
        Err(resp) => return resp,
    };
    let resolved = state
        .hierarchical
        .resolve_and_search(
            object_type,
            &req.query,
            req.limit.unwrap_or(state.default_limit),
            req.user_email.as_deref(),
        )
        .await;
    Json(resolved).into_response()
}

async fn mappings<C: CrmApi>(
    State(state): State<AppState<C>>,
    Path(object_type): Path<String>,
) -> Response {
    let object_type = match parse_object_type(&object_type) {
        Ok(ot) => ot,
        Err(resp) => return resp,
    };
    match state.resolver.get_available_mappings(object_type) {
        Some(summary) => Json(summary).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("no encyclopedia loaded for {object_type}; refresh first")
            })),
        )
            .into_response(),
    }
}

async fn search_mappings<C: CrmApi>(
    State(state): State<AppState<C>>,
    Path(object_type): Path<String>,
    Query(params): Query<SearchMappingsParams>,
) -> Response {
    let object_type = match parse_object_type(&object_type) {
        Ok(ot) => ot,
        Err(resp) => return resp,
    };
    match state.resolver.search_mappings(object_type, &params.term) {
        Some(matches) => Json(matches).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("no encyclopedia loaded for {object_type}; refresh first")
            })),
        )
            .into_response(),
    }
}

async fn refresh<C: CrmApi>(
    State(state): State<AppState<C>>,
    Json(req): Json<RefreshRequest>,
) -> Response {
    let object_type = match req.object_type.as_deref() {
        Some(raw) => match parse_object_type(raw) {
            Ok(ot) => Some(ot),
            Err(resp) => return resp,
        },
        None => None,
    };

    let refreshed = state.exporter.refresh(object_type).await;
    let mut counts = BTreeMap::new();
    for (ot, encyclopedia) in refreshed {
        counts.insert(
            ot.to_string(),
            json!({
                "properties": encyclopedia.property_mappings.len(),
                "values": encyclopedia.total_values(),
            }),
        );
        state.resolver.install(ot, encyclopedia);
    }

    Json(json!({ "refreshed": counts })).into_response()
}
