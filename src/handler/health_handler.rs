use crate::storage::ImageStorage;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct PingResponse {
    success: bool,
    message: &'static str,
}

pub(crate) async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        success: true,
        message: "pong",
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    database: &'static str,
    image_dir: &'static str,
    timestamp: DateTime<Utc>,
}

fn check(ok: bool) -> &'static str {
    if ok { "ok" } else { "error" }
}

/// Reports database reachability and whether the image directory exists.
pub(crate) async fn health(db: Arc<DatabaseConnection>, images: ImageStorage) -> Response {
    tracing::debug!("Health check requested");

    let database_ok = db.ping().await.is_ok();
    let image_dir_ok = tokio::fs::metadata(images.base_dir())
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    let healthy = database_ok && image_dir_ok;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: check(healthy),
        database: check(database_ok),
        image_dir: check(image_dir_ok),
        timestamp: Utc::now(),
    };

    (status, Json(body)).into_response()
}
