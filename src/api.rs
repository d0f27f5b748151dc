// 🌐 HTTP API - routing, caching headers, problem responses
//
// GET /               → usage map
// GET /api/health     → liveness
// GET /{codice_istat} → SVG badge (any other path falls through to the badge handler)

use crate::badge::BadgeImage;
use crate::config::BadgeConfig;
use crate::error::BadgeError;
use crate::service::BadgeService;
use crate::validation::validate_badge_request;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: BadgeService,
    pub cache_control: String,
}

impl AppState {
    pub fn new(service: BadgeService, config: &BadgeConfig) -> Self {
        AppState {
            service,
            cache_control: config.cache_control(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(usage).fallback(method_not_allowed))
        .route("/api/health", get(health_check).fallback(method_not_allowed))
        .fallback(badge)
        .with_state(state)
        .layer(CorsLayer::permissive())
        // Failures are already logged once by `problem`
        .layer(TraceLayer::new_for_http().on_failure(()))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET / - Describe the two usage patterns
async fn usage() -> Json<Value> {
    Json(usage_map())
}

/// Static usage payload served for the empty path
pub fn usage_map() -> Value {
    json!({
        "/": "Descrizione dell'API.",
        "/{codice_istat}": "Ritorna un badge con lo stato di migrazione del tuo comune.",
    })
}

/// GET /api/health - Health check, never touches the registry
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// GET /{codice_istat} - Render the migration badge
async fn badge(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let path = uri.path().to_string();

    if method != Method::GET && method != Method::HEAD {
        return problem(BadgeError::MethodNotAllowed(method), &path);
    }

    // Validation happens before any network call
    let identifier = match validate_badge_request(&path, &query) {
        Ok(Some(identifier)) => identifier,
        Ok(None) => return usage().await.into_response(),
        Err(e) => return problem(e, &path),
    };

    match state.service.handle(&identifier, Utc::now()).await {
        Ok(image) => badge_response(image, &state.cache_control, &headers),
        Err(e) => problem(e, &path),
    }
}

/// Any method other than GET/HEAD on a fixed route
async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    problem(BadgeError::MethodNotAllowed(method), uri.path())
}

// ============================================================================
// Response shaping
// ============================================================================

fn problem(err: BadgeError, path: &str) -> Response {
    err.log(path);
    err.to_problem(path).into_response()
}

fn badge_response(image: BadgeImage, cache_control: &str, request_headers: &HeaderMap) -> Response {
    let etag = image.etag();

    let mut response = if etag_matches(request_headers, &etag) {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut response = image.bytes.into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(image.media_type),
        );
        response
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, value);
    }
    response
}

/// Weak comparison, as `If-None-Match` requires
fn etag_matches(request_headers: &HeaderMap, etag: &str) -> bool {
    request_headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|tag| tag.trim())
        .any(|tag| tag == "*" || tag.trim_start_matches("W/") == etag)
}
