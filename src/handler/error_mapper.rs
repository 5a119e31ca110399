use crate::http::response::ApiResponse;
use crate::service::error::{ServiceError, ServiceErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::error;

fn status_code_for(kind: ServiceErrorKind) -> StatusCode {
    match kind {
        ServiceErrorKind::Validation => StatusCode::BAD_REQUEST,
        ServiceErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ServiceErrorKind::NotFound => StatusCode::NOT_FOUND,
        ServiceErrorKind::Storage | ServiceErrorKind::Database => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_code_for(self.kind());
        if status.is_server_error() {
            error!(error = %self, "Catalog operation failed");
        }
        ApiResponse::<Value>::error_with_status(self.to_string(), status).into_response()
    }
}
