pub(crate) mod fish_handler;
mod error_mapper;
pub(crate) mod health_handler;

use crate::http::auth::SharedAuthConfig;
use crate::http::response::ApiResponse;
use crate::service::fish_service::FishService;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Route prefix under which the image directory is served.
pub(crate) const IMAGES_ROUTE: &str = "/images";

pub(crate) fn api_v1_router(service: FishService, auth_config: SharedAuthConfig) -> Router {
    Router::new().merge(fish_handler::router(service, auth_config))
}

pub(super) fn success_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    ApiResponse::success_with_status(data, status).into_response()
}
