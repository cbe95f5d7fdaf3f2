//! HTTP error response mapping.

use std::str::FromStr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crmflow_domain::error::{CrmFlowError, ValidationError};
use crmflow_domain::execution::error_chain;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`CrmFlowError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(CrmFlowError);

impl From<CrmFlowError> for ApiError {
    fn from(err: CrmFlowError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CrmFlowError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            CrmFlowError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            CrmFlowError::Storage(_) => {
                tracing::error!(error = %error_chain(&self.0), "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Parse a path identifier, rejecting malformed ones as a bad request.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    T::from_str(raw).map_err(|_| ValidationError::InvalidId.into())
}
