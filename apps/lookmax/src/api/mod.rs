//! # HTTP API
//!
//! REST endpoints over face analysis records.
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | GET | `/health` | `{status, version}` |
//! | POST | `/api/analyze` | new record with the canned payload |
//! | GET | `/api/analyses` | all records of the current user |
//! | GET | `/api/analyses/{id}` | one record or 404 |
//! | DELETE | `/api/analyses/{id}` | confirmation or 404 |
//! | GET | `/models/*` | static detection model files |
//!
//! `/api/*` routes pass through the optional API key check and the optional
//! global rate limit. `/health` and `/models` never do.

pub mod error;

pub use error::ApiError;

use crate::config::ServerConfig;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lookmax_client::{HealthResponse, MessageResponse};
use lookmax_core::{
    AnalysisId, AnalysisPayload, AnalysisStore, DEFAULT_USER_ID, FaceAnalysisRecord,
    NewFaceAnalysis, Storage,
};
use serde_json::Value;
use std::num::{FpCategory, NonZeroU32};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

// =============================================================================
// STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Storage>>,
    pub api_key: Option<Arc<str>>,
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.api_key.is_some())
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

impl AppState {
    /// State with no authentication and no rate limit.
    pub fn new(store: Storage) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            api_key: None,
            limiter: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, per_second: NonZeroU32) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::direct(Quota::per_second(per_second))));
        self
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the router from validated configuration.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = router(state, config.body_limit);
    if let Some(dir) = &config.models_dir {
        info!(dir = %dir.display(), "serving detection models");
        app = app.nest_service("/models", ServeDir::new(dir));
    }
    app
}

/// The API routes and layers, without static model files.
pub fn router(state: AppState, body_limit: usize) -> Router {
    let api = Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/analyses", get(list_analyses))
        .route(
            "/api/analyses/{id}",
            get(get_analysis).delete(delete_analysis),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = &state.api_key else {
        return Ok(next.run(request).await);
    };
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(next.run(request).await)
    } else {
        warn!(path = %request.uri().path(), "rejected request without valid API key");
        Err(ApiError::Unauthorized)
    }
}

async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter
        && limiter.check().is_err()
    {
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Falsy values count as "no image": absent, null, false, 0 and "".
fn has_image_data(body: &[u8]) -> bool {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return false;
    };
    match map.get("imageData") {
        None | Some(Value::Null | Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n
            .as_f64()
            .is_some_and(|f| !matches!(f.classify(), FpCategory::Zero | FpCategory::Nan)),
        Some(_) => true,
    }
}

/// Server timestamp: UTC, millisecond precision, `Z` suffix.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FaceAnalysisRecord>, ApiError> {
    if !has_image_data(&body) {
        return Err(ApiError::NoImageData);
    }

    // The image itself is not kept; the record only names it.
    let new = NewFaceAnalysis::new(
        DEFAULT_USER_ID,
        format!("facial-analysis-{}.jpg", Uuid::new_v4()),
        AnalysisPayload::canned(),
    );
    let record = state
        .store
        .write()
        .await
        .create(new, &timestamp())
        .map_err(ApiError::internal("Failed to analyze face"))?;

    info!(id = %record.id, bytes = body.len(), "analysis created");
    Ok(Json(record))
}

async fn list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<FaceAnalysisRecord>>, ApiError> {
    let records = state
        .store
        .read()
        .await
        .list_by_user(DEFAULT_USER_ID)
        .map_err(ApiError::internal("Failed to fetch analyses"))?;
    Ok(Json(records))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FaceAnalysisRecord>, ApiError> {
    let id: AnalysisId = id.parse().map_err(|_| ApiError::NotFound)?;
    state
        .store
        .read()
        .await
        .get(id)
        .map_err(ApiError::internal("Failed to fetch analysis"))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: AnalysisId = id.parse().map_err(|_| ApiError::NotFound)?;
    let deleted = state
        .store
        .write()
        .await
        .delete(id)
        .map_err(ApiError::internal("Failed to delete analysis"))?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    debug!(%id, "analysis deleted");
    Ok(Json(MessageResponse {
        message: "Analysis deleted successfully".to_string(),
    }))
}

// =============================================================================
// TESTS
// =============================================================================
