use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use cellar_core::{CoreError, analytics::AnalyticsError};
use http::StatusCode;
use serde::Serialize;
use tracing::{error, warn};

// Declare sub-modules within the application layer
pub mod analytics;
pub mod commands;
pub mod menu;
pub mod restaurants;
pub mod sales;
pub mod wines;

// Top-level error type for the HTTP layer
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Picks the status and client-facing message for a core error.
///
/// Store and configuration failures are logged here and answered with a generic message.
pub fn map_core_error(err: &CoreError) -> (StatusCode, String) {
    match err {
        CoreError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        CoreError::AlreadyExists(what) => (StatusCode::CONFLICT, format!("{what} already exists")),
        CoreError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        CoreError::Infrastructure(_) | CoreError::Configuration(_) | CoreError::Internal(_) => {
            error!("CoreError occurred: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Core(err) => map_core_error(err),
            ApiError::Analytics(AnalyticsError::RestaurantNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Restaurant {id} not found"))
            }
            ApiError::Analytics(AnalyticsError::AggregationFailed(err)) => {
                error!("Analytics aggregation failed: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch analytics".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };
        if status.is_client_error() {
            warn!(%status, %message, "Request rejected");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// JSON body extractor whose rejections answer `{"error": ...}` with 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}
