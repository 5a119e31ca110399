//! Router composition.
//!
//! `AppBuilder` only collects routes. Runtime layers such as logging,
//! tracing, CORS and the body limit are applied later by `Server::start`.

use crate::http::response::ApiResponse;
use axum::{Router, http::StatusCode, routing::MethodRouter};
use tower_http::services::ServeDir;

pub(crate) struct AppBuilder {
    router: Router,
    known_endpoints: Vec<String>,
}

impl AppBuilder {
    pub(crate) fn new() -> Self {
        Self {
            router: Router::new(),
            known_endpoints: Vec::new(),
        }
    }

    pub(crate) fn route(mut self, path: &str, method: MethodRouter) -> Self {
        self.router = self.router.route(path, method);
        self.known_endpoints.push(path.to_string());
        self
    }

    pub(crate) fn nest(mut self, path: &str, router: Router) -> Self {
        self.router = self.router.nest(path, router);
        self.known_endpoints.push(format!("{path}/*"));
        self
    }

    /// Serve a directory of static files under `path`.
    pub(crate) fn static_dir(mut self, path: &str, dir: ServeDir) -> Self {
        self.router = self.router.nest_service(path, dir);
        self.known_endpoints.push(format!("{path}/*"));
        self
    }

    pub(crate) fn into_parts(self) -> (Router, Vec<String>) {
        let mut endpoints = self.known_endpoints;
        endpoints.sort();
        endpoints.dedup();

        (self.router.fallback(fallback_handler), endpoints)
    }
}

async fn fallback_handler() -> ApiResponse<()> {
    ApiResponse::error_with_status("Endpoint not found", StatusCode::NOT_FOUND)
}
