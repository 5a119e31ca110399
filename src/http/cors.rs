//! CORS layer for browser front-ends of the catalog.

use crate::http::server::ConfigError;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:8080"];
const MAX_AGE_SECONDS: u64 = 86_400;

#[derive(Debug, Clone)]
pub(crate) struct CorsConfig {
    pub(crate) allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl CorsConfig {
    /// Comma separated origin list, e.g. `CORS_ALLOWED_ORIGINS`.
    pub(crate) fn from_list(raw: &str) -> Self {
        let allowed_origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        if allowed_origins.is_empty() {
            Self::default()
        } else {
            Self { allowed_origins }
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::EmptyAllowedOrigins);
        }
        for origin in &self.allowed_origins {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidCors(format!("invalid origin `{origin}`")))?;
        }
        Ok(())
    }

    pub(crate) fn build_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([HeaderName::from_static("x-request-id")])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(MAX_AGE_SECONDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_list_falls_back_to_localhost() {
        let config = CorsConfig::from_list(" , ");
        assert_eq!(config.allowed_origins, DEFAULT_ORIGINS.to_vec());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_origin_list() {
        let config = CorsConfig::from_list("https://fish.example, https://admin.fish.example");
        assert_eq!(
            config.allowed_origins,
            vec!["https://fish.example", "https://admin.fish.example"]
        );
    }

    #[test]
    fn rejects_origin_with_control_characters() {
        let config = CorsConfig {
            allowed_origins: vec!["https://bad\n.example".to_string()],
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCors(_))));
    }
}
