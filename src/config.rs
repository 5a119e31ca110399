//! Runtime settings read from the environment (a `.env` file is loaded first).

use crate::http::{
    cors::CorsConfig,
    logging::{LogFormat, LoggingConfig},
    server::{ConfigError, ServerConfig},
};
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "sqlite://fishmarket.db?mode=rwc";
const DEFAULT_IMAGE_DIR: &str = "public/images";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct AppSettings {
    pub(crate) database_url: String,
    pub(crate) image_dir: PathBuf,
    pub(crate) server: ServerConfig,
    pub(crate) logging: LoggingConfig,
    pub(crate) admin_password: String,
    pub(crate) user_password: String,
    pub(crate) bcrypt_cost: u32,
}

impl AppSettings {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let text = |name: &'static str, default: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        let max_upload_bytes = parse_var(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let bcrypt_cost = parse_var(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidEnv {
                name: "LOG_FORMAT",
                value: raw,
            })?,
            None => LogFormat::Pretty,
        };

        let cors = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| CorsConfig::from_list(&raw))
            .unwrap_or_default();

        let server = ServerConfig::new(port)
            .with_host(text("HOST", DEFAULT_HOST))
            .with_max_body_bytes(max_upload_bytes)
            .with_cors(Some(cors));
        server.validate()?;

        Ok(Self {
            database_url: sanitize_sqlite_url(text("DATABASE_URL", DEFAULT_DATABASE_URL)),
            image_dir: PathBuf::from(text("IMAGE_DIR", DEFAULT_IMAGE_DIR)),
            server,
            logging: LoggingConfig {
                format: log_format,
                json_file: lookup("LOG_FILE")
                    .filter(|value| !value.trim().is_empty())
                    .map(PathBuf::from),
                ..LoggingConfig::default()
            },
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or_else(|| "admin".to_string()),
            user_password: lookup("USER_PASSWORD").unwrap_or_else(|| "user".to_string()),
            bcrypt_cost,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value: raw }),
        _ => Ok(default),
    }
}

/// The sqlx SQLite driver rejects a `foreign_keys` query parameter, drop it.
pub(crate) fn sanitize_sqlite_url(database_url: String) -> String {
    let is_sqlite = database_url.starts_with("sqlite://") || database_url.starts_with("sqlite:");
    if !is_sqlite {
        return database_url;
    }

    let mut parts = database_url.splitn(2, '?');
    let base = parts.next().unwrap_or_default();
    let Some(query) = parts.next() else {
        return database_url;
    };

    let filtered: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !key.eq_ignore_ascii_case("foreign_keys")
        })
        .collect();

    if filtered.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", filtered.join("&"))
    }
}
