//! HTTP Route Handlers

pub mod alerts;
pub mod metrics;
pub mod team;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use alert_service::AlertError;

/// Wire shape for request failures
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Maps engine errors onto HTTP statuses
pub struct ApiError(AlertError);

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AlertError::NotFound => StatusCode::NOT_FOUND,
            AlertError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AlertError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
