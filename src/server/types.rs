use crate::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub session_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::BadRequest(detail)
            | ApiError::NotFound(detail)
            | ApiError::PayloadTooLarge(detail)
            | ApiError::Internal(detail) => detail,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest(msg) => ApiError::BadRequest(msg),
            Error::NoPreviousQuestion { .. } | Error::NoPreviousAnswer { .. } => {
                ApiError::NotFound(err.to_string())
            }
            other => {
                error!("Unhandled error while serving request: {}", other);
                ApiError::Internal(format!("An internal server error occurred: {}", other))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            detail: self.detail().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_mapping() {
        let bad = ApiError::from(Error::invalid_request("Please provide a question or an image."));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.detail(), "Please provide a question or an image.");

        let missing = ApiError::from(Error::NoPreviousAnswer {
            session_id: "abc".to_string(),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            missing.detail(),
            "No previous answer found in this session to simplify."
        );

        let internal = ApiError::from(Error::internal("Mutex lock failed"));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            internal.detail(),
            "An internal server error occurred: Internal error: Mutex lock failed"
        );
    }
}
