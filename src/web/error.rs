//! Mapping errors onto HTTP responses

use crate::api::types::ErrorBody;
use crate::core::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

/// Handler error; every failure leaves as `{"detail": ...}`
pub struct ApiError(pub Error);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation { .. } | Error::Rejected { .. } | Error::Credit(_) | Error::Json(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::ServerNotFound { .. } | Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Conflict { .. } => StatusCode::CONFLICT,
        Error::Vos { .. } | Error::Transport { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self.0);
        } else {
            warn!(status = status.as_u16(), "{}", self.0);
        }

        let current_hash = match &self.0 {
            Error::Conflict { current_hash, .. } => current_hash.clone(),
            _ => None,
        };
        let body = ErrorBody {
            detail: self.0.to_string(),
            current_hash,
        };
        (status, Json(body)).into_response()
    }
}
