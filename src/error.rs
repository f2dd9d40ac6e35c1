//! Error types for the cache and its HTTP front-end
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors raised by the cache machinery itself.
///
/// None of these come from the resource accessor: fetch failures are
/// returned to the reader with their own type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid configuration, the cache refuses to start
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A background sweep cycle failed; logged, never returned to readers
    #[error("Sweep cycle failed: {0}")]
    SweepCycle(String),

    /// `start` was called on a sweeper that is already running
    #[error("Sweeper is already running")]
    SweeperAlreadyRunning,

    /// The sweeper needs a Tokio runtime to schedule its task
    #[error("No Tokio runtime available to run the sweeper")]
    NoRuntime,
}

// == Read Error ==
/// Failure of a time-bounded read.
#[derive(Error, Debug)]
pub enum ReadError<E> {
    /// The resource accessor failed
    #[error("{0}")]
    Fetch(E),

    /// The read did not finish in time; nothing was cached
    #[error("Fetch timed out after {0:?}")]
    TimedOut(Duration),
}

impl<E> ReadError<E> {
    /// Returns the accessor's error, if that is what failed.
    pub fn into_fetch(self) -> Option<E> {
        match self {
            ReadError::Fetch(err) => Some(err),
            ReadError::TimedOut(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ReadError::TimedOut(_))
    }
}

// == Upstream Error ==
/// Failure talking to the upstream HTTP origin.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport-level failure (connect, body read, ...)
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured origin URL cannot address resources
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },
}

// == API Error ==
/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Upstream did not answer within {0:?}")]
    TimedOut(Duration),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ReadError<UpstreamError>> for ApiError {
    fn from(err: ReadError<UpstreamError>) -> Self {
        match err {
            ReadError::Fetch(err) => ApiError::Upstream(err),
            ReadError::TimedOut(after) => ApiError::TimedOut(after),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Upstream(UpstreamError::Status { status: 404, .. }) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
