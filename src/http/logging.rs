//! Logging initialization and request logging middleware.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;
static JSON_LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LoggingConfig {
    pub(crate) format: LogFormat,
    pub(crate) include_target: bool,
    /// Optional JSON-lines file written alongside terminal output.
    pub(crate) json_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            include_target: false,
            json_file: None,
        }
    }
}

fn is_valid_request_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b':'))
}

fn normalized_request_id(candidate: Option<&str>) -> String {
    if let Some(raw) = candidate {
        let trimmed = raw.trim();
        if is_valid_request_id(trimmed) {
            return trimmed.to_string();
        }
    }

    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let json_layer = match &config.json_file {
        Some(path) => {
            let writer = build_json_file_writer(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(config.include_target)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let terminal_layer = tracing_subscriber::fmt::layer().with_target(config.include_target);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer);

    let init_result = match config.format {
        LogFormat::Json => registry.with(terminal_layer.json()).try_init(),
        LogFormat::Pretty => registry.with(terminal_layer.pretty()).try_init(),
    };

    if let Err(err) = init_result {
        // tests and embedding binaries may have installed a subscriber already
        if err.to_string().contains("already been set") {
            return Ok(());
        }
        return Err(Box::new(err));
    }

    info!("Logging system initialized");
    Ok(())
}

fn build_json_file_writer(
    path: &Path,
) -> Result<tracing_appender::non_blocking::NonBlocking, Box<dyn std::error::Error>> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "LOG_FILE must contain a file name",
        )
    })?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = JSON_LOG_GUARD.set(guard);
    Ok(non_blocking)
}

pub(crate) async fn structured_logging_middleware(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let request_id = normalized_request_id(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );
    let span = info_span!("request", request_id = %request_id);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Request started"
    );

    // handler events inherit the request id from this span
    let mut response = next.run(request).instrument(span).await;
    let duration_ms = start_time.elapsed().as_millis();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    match status.as_u16() {
        200..=399 => info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms,
            "Request completed"
        ),
        400..=499 => warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms,
            "Client error"
        ),
        500..=599 => error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms,
            "Server error"
        ),
        _ => debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms,
            "Request completed"
        ),
    }

    response
}
