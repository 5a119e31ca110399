//! HTTP Basic authentication against the static catalog credential store.
//!
//! Two accounts exist: `admin` (roles `admin`, `user`) manages the catalog,
//! `user` (role `user`) may only browse it. Passwords are kept as bcrypt
//! hashes. The middleware writes an `AuthUser` into request extensions and
//! `require_roles` guards routes on top of it.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

use crate::http::response::ApiResponse;

pub(crate) const ROLE_ADMIN: &str = "admin";
pub(crate) const ROLE_USER: &str = "user";
const REALM_HEADER: &str = "Basic realm=\"fishmarket\"";

pub(crate) type SharedAuthConfig = Arc<AuthConfig>;

#[derive(Debug, Clone)]
pub(crate) struct BasicUser {
    pub(crate) username: String,
    password_hash: String,
    pub(crate) roles: Vec<String>,
}

impl BasicUser {
    pub(crate) fn new(
        username: &str,
        password: &str,
        roles: &[&str],
        cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        Ok(Self {
            username: username.to_string(),
            password_hash: bcrypt::hash(password, cost)?,
            roles: roles.iter().map(|role| role.to_string()).collect(),
        })
    }

    pub(crate) fn verify_password(&self, password: &str) -> Result<bool, bcrypt::BcryptError> {
        bcrypt::verify(password, &self.password_hash)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AuthConfig {
    pub(crate) users: Vec<BasicUser>,
}

impl AuthConfig {
    /// The fixed two-account store of the catalog.
    pub(crate) fn catalog_users(
        admin_password: &str,
        user_password: &str,
        cost: u32,
    ) -> Result<Self, AuthError> {
        let users = vec![
            BasicUser::new("admin", admin_password, &[ROLE_ADMIN, ROLE_USER], cost)?,
            BasicUser::new("user", user_password, &[ROLE_USER], cost)?,
        ];
        Ok(Self { users })
    }

    pub(crate) fn find_user(&self, username: &str) -> Option<&BasicUser> {
        self.users.iter().find(|user| user.username == username)
    }

    pub(crate) fn shared(self) -> SharedAuthConfig {
        Arc::new(self)
    }
}

/// Authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub(crate) struct AuthUser {
    pub(crate) username: String,
    pub(crate) roles: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Password verification did not complete")]
    VerificationAborted,
    #[error("Failed to hash password: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::Hashing(_) | Self::VerificationAborted => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response =
            ApiResponse::<()>::error_with_status(self.to_string(), status).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(REALM_HEADER),
            );
        }
        response
    }
}

fn extract_basic_credentials(request: &Request) -> Result<(String, String), AuthError> {
    let auth_str = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthFormat)?;

    let encoded = auth_str
        .strip_prefix("Basic ")
        .ok_or(AuthError::InvalidAuthFormat)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|_| AuthError::InvalidAuthFormat)?;
    let credentials = String::from_utf8(decoded).map_err(|_| AuthError::InvalidAuthFormat)?;

    credentials
        .split_once(':')
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .ok_or(AuthError::InvalidAuthFormat)
}

pub(crate) async fn basic_auth_middleware(
    State(config): State<SharedAuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (username, password) = extract_basic_credentials(&request)?;

    let Some(user) = config.find_user(&username) else {
        warn!(username = %username, "Basic authentication failed: unknown user");
        return Err(AuthError::InvalidCredentials);
    };

    // bcrypt is deliberately slow, keep it off the async workers
    let candidate = user.clone();
    let is_valid = tokio::task::spawn_blocking(move || candidate.verify_password(&password))
        .await
        .map_err(|_| AuthError::VerificationAborted)?
        .map_err(|_| AuthError::InvalidCredentials)?;
    if !is_valid {
        warn!(username = %username, "Basic authentication failed: wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    request.extensions_mut().insert(AuthUser {
        username: username.clone(),
        roles: user.roles.clone(),
    });
    info!(username = %username, "Basic authentication successful");

    Ok(next.run(request).await)
}

/// Route guard passing callers that hold at least one of `roles`.
pub(crate) fn require_roles(
    roles: &[&str],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>
+ Clone {
    let required_roles: HashSet<String> = roles.iter().map(|r| r.to_string()).collect();

    move |request: Request, next: Next| {
        let required_roles = required_roles.clone();

        Box::pin(async move {
            let auth_user = request
                .extensions()
                .get::<AuthUser>()
                .ok_or(AuthError::MissingAuthHeader)?;

            if !auth_user.roles.iter().any(|role| required_roles.contains(role)) {
                return Err(AuthError::InsufficientPermissions);
            }

            Ok(next.run(request).await)
        })
    }
}
