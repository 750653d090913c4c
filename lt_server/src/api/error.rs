//! Error responses.
//!
//! Handlers return `Result<_, ApiError>`. Every error body has the shape
//! `{"error": "<message>"}`; store failures only ever say
//! "Internal server error".

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lol_tournament::ServiceError;
use serde::{Deserialize, Serialize};

use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP-facing error: a status code and a client-safe message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

/// Status code for each service error kind
pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Invalid(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound { .. } | ServiceError::NoWinner(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = status_for(&err);
        logging::log_service_error(status.as_u16(), &err);
        Self::new(status, err.client_message())
    }
}

/// Missing, malformed or mistyped JSON bodies are all client errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a JSON body with content-type application/json.".to_string()
            }
            other => format!("Invalid request body: {}", other.body_text()),
        };
        Self::bad_request(message)
    }
}

/// Path parameters that fail to parse, e.g. a non-numeric id
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(
            rejection.status(),
            format!("Invalid request path: {}", rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        metrics::api_errors_total(self.status.as_u16());
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
