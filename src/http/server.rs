//! Server bootstrap.
//!
//! `AppBuilder -> Server::new(...) -> Server::start()`.

use crate::http::{
    app::AppBuilder, cors::CorsConfig, logging::structured_logging_middleware,
};
use axum::{Router, extract::DefaultBodyLimit, middleware};
use std::net::SocketAddr;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    /// Upper bound for a request body, multipart uploads included.
    pub(crate) max_body_bytes: usize,
    pub(crate) cors: Option<CorsConfig>,
}

impl ServerConfig {
    pub(crate) fn new(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            max_body_bytes: 15 * 1024 * 1024,
            cors: Some(CorsConfig::default()),
        }
    }

    pub(crate) fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub(crate) fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub(crate) fn with_cors(mut self, cors: Option<CorsConfig>) -> Self {
        self.cors = cors;
        self
    }

    pub(crate) fn address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            ConfigError::InvalidSocketAddress {
                host: self.host.clone(),
                port: self.port,
            }
        })
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        // port 0 would let the OS pick one, require an explicit port
        if self.port == 0 {
            return Err(ConfigError::InvalidPort { port: self.port });
        }

        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidBodyLimit);
        }

        if let Some(cors) = &self.cors {
            cors.validate()?;
        }

        self.address()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(8080)
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16 },
    #[error("Empty host address")]
    EmptyHost,
    #[error("Invalid socket address: {host}:{port}")]
    InvalidSocketAddress { host: String, port: u16 },
    #[error("Request body limit must be greater than zero")]
    InvalidBodyLimit,
    #[error("Empty allowed origins")]
    EmptyAllowedOrigins,
    #[error("Invalid CORS configuration: {0}")]
    InvalidCors(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

pub(crate) struct Server {
    server_config: ServerConfig,
    app_builder: AppBuilder,
}

impl Server {
    pub(crate) fn new(server_config: ServerConfig, app_builder: AppBuilder) -> Self {
        Self {
            server_config,
            app_builder,
        }
    }

    pub(crate) async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_config
            .validate()
            .map_err(|e| format!("Invalid server configuration: {e}"))?;

        let (app, endpoints) = self.app_builder.into_parts();
        let app = apply_app_layers(app, &self.server_config);
        let addr = self.server_config.address()?;

        info!(
            host = %self.server_config.host,
            port = self.server_config.port,
            cors_enabled = self.server_config.cors.is_some(),
            endpoints = ?endpoints,
            "Server starting on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("Server stopped");
        Ok(())
    }
}

pub(crate) fn apply_app_layers(mut router: Router, config: &ServerConfig) -> Router {
    router = router
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(middleware::from_fn(structured_logging_middleware));

    if let Some(cors) = &config.cors {
        router = router.layer(cors.build_layer());
    }

    router
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };

    info!(signal, "Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_port_zero_and_empty_host() {
        assert!(matches!(
            ServerConfig::new(0).validate(),
            Err(ConfigError::InvalidPort { port: 0 })
        ));
        assert!(matches!(
            ServerConfig::new(8080).with_host("").validate(),
            Err(ConfigError::EmptyHost)
        ));
    }

    #[test]
    fn rejects_unparsable_host() {
        assert!(matches!(
            ServerConfig::new(8080).with_host("not a host").validate(),
            Err(ConfigError::InvalidSocketAddress { .. })
        ));
    }

    #[test]
    fn rejects_zero_body_limit() {
        assert!(matches!(
            ServerConfig::new(8080).with_max_body_bytes(0).validate(),
            Err(ConfigError::InvalidBodyLimit)
        ));
    }

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.address().unwrap().port(), 8080);
    }
}
