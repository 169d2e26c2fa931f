//! HTTP error responses for the gateway.
//!
//! Every failure is rendered as `{"error": "<message>"}` with a status chosen
//! by kind:
//!
//! | cause                                   | HTTP status |
//! |-----------------------------------------|-------------|
//! | malformed JSON body                     | 400         |
//! | gRPC `NOT_FOUND`                        | 404         |
//! | gRPC `UNAVAILABLE` (backend unreachable) | 502        |
//! | any other gRPC status, incl. `INTERNAL` | 500         |

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tonic::{Code, Status};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body could not be parsed as a book.
    #[error("{0}")]
    BadRequest(String),

    /// The backend answered with a non-OK status.
    #[error("{}", .0.message())]
    Rpc(#[from] Status),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rpc(status) => match status.code() {
                Code::NotFound => StatusCode::NOT_FOUND,
                Code::Unavailable => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, "Request failed: {self}");
        } else {
            tracing::info!(%status, "Request rejected: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rpc_codes_to_http_statuses() {
        let cases = [
            (Status::not_found("no such book"), StatusCode::NOT_FOUND),
            (Status::invalid_argument("bad"), StatusCode::INTERNAL_SERVER_ERROR),
            (Status::unavailable("down"), StatusCode::BAD_GATEWAY),
            (Status::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
            (Status::unknown("?"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (status, expected) in cases {
            assert_eq!(ApiError::from(status).status_code(), expected);
        }
    }

    #[test]
    fn bad_request_is_400() {
        let err = ApiError::BadRequest("expected value".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "expected value");
    }

    #[test]
    fn rpc_message_becomes_error_text() {
        let err = ApiError::from(Status::not_found("Could not find book with bookId \"b1\""));
        assert_eq!(err.to_string(), "Could not find book with bookId \"b1\"");
    }
}
