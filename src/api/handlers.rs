//! API Handlers
//!
//! HTTP request handlers for each caching proxy endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::cache::CacheStats;
use crate::error::ApiError;
use crate::models::{
    validate_key, ClearResponse, HealthResponse, InvalidateResponse, ResourceResponse,
    WriteRequest, WriteResponse,
};
use crate::proxy::CachingProxy;
use crate::tasks::Sweeper;
use crate::upstream::HttpAccessor;

type Result<T> = std::result::Result<T, ApiError>;

/// Proxy specialised to the HTTP origin.
pub type HttpProxy = CachingProxy<HttpAccessor>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<HttpProxy>,
    /// Upper bound on a single read, fetch included
    pub fetch_timeout: Duration,
    /// Background sweeper, when one was started
    pub sweeper: Option<Arc<Mutex<Sweeper<String, String>>>>,
}

impl AppState {
    pub fn new(proxy: HttpProxy, fetch_timeout: Duration) -> Self {
        Self {
            proxy: Arc::new(proxy),
            fetch_timeout,
            sweeper: None,
        }
    }

    pub fn with_sweeper(mut self, sweeper: Sweeper<String, String>) -> Self {
        self.sweeper = Some(Arc::new(Mutex::new(sweeper)));
        self
    }
}

fn checked_key(key: String) -> Result<String> {
    match validate_key(&key) {
        Some(error_msg) => Err(ApiError::InvalidRequest(error_msg)),
        None => Ok(key),
    }
}

/// Handler for GET /resource/:key
///
/// Serves the cached copy while fresh, otherwise downloads it from the origin.
pub async fn read_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ResourceResponse>> {
    let key = checked_key(key)?;
    let value = state
        .proxy
        .read_with_timeout(&key, state.fetch_timeout)
        .await?;

    Ok(Json(ResourceResponse::new(key, value)))
}

/// Handler for PUT /resource/:key
///
/// Writes through to the origin; the cached copy is invalidated around the
/// upload.
pub async fn write_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    let key = checked_key(key)?;
    let proxy = &state.proxy;
    proxy
        .write(&key, proxy.accessor().upload(&key, req.value))
        .await?;

    Ok(Json(WriteResponse::new(key)))
}

/// Handler for DELETE /cache/:key
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let key = checked_key(key)?;
    let invalidated = state.proxy.invalidate(&key);

    Ok(Json(InvalidateResponse::new(key, invalidated)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.proxy.invalidate_all();
    info!("Cache cleared on request");
    Json(ClearResponse::new("Cache cleared"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats<String>> {
    Json(state.proxy.stats())
}

/// Handler for DELETE /stats
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.proxy.reset_stats();
    Json(ClearResponse::new("Statistics reset"))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let sweeper_running = match &state.sweeper {
        Some(sweeper) => sweeper.lock().await.is_running(),
        None => false,
    };
    Json(HealthResponse::healthy(sweeper_running))
}
