//! Error responses in the `{success: false, error, details?}` shape the client expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medconnect_api_shared::{Envelope, ErrorBody, FieldIssue};

#[derive(Debug)]
pub struct StubError {
    status: StatusCode,
    body: ErrorBody,
}

impl StubError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(error),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn unauthorised(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// 400 with field-level issues.
    pub fn validation(details: Vec<FieldIssue>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::new("Validation failed").with_details(details),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("stub error {}: {:?}", self.status, self.body.error);
        }
        (self.status, Json(self.body)).into_response()
    }
}

pub type StubResult<T> = Result<Json<Envelope<T>>, StubError>;

/// Wrap a payload in the success envelope.
pub fn ok<T>(data: T) -> StubResult<T> {
    Ok(Json(Envelope::ok(data)))
}
