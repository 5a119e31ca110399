use sea_orm::DbErr;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ServiceErrorKind {
    Validation,
    PayloadTooLarge,
    NotFound,
    Storage,
    Database,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ServiceError {
    #[error("invalid fish data: {0}")]
    Validation(String),
    #[error("upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("fish with id={id} was not found")]
    NotFound { id: i32 },
    #[error("{message}: {source}")]
    Storage {
        message: String,
        #[source]
        source: io::Error,
    },
    #[error("database error: {0}")]
    Database(String),
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    pub(crate) fn not_found(id: i32) -> Self {
        Self::NotFound { id }
    }

    pub(crate) fn storage(message: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::Validation(_) => ServiceErrorKind::Validation,
            Self::PayloadTooLarge(_) => ServiceErrorKind::PayloadTooLarge,
            Self::NotFound { .. } => ServiceErrorKind::NotFound,
            Self::Storage { .. } => ServiceErrorKind::Storage,
            Self::Database(_) => ServiceErrorKind::Database,
        }
    }
}

pub(crate) fn map_db_error(error: DbErr) -> ServiceError {
    match error {
        DbErr::Json(message) | DbErr::Type(message) => ServiceError::Validation(message),
        other => {
            let message = other.to_string();
            let lowered = message.to_ascii_lowercase();

            if lowered.contains("not null constraint failed")
                || lowered.contains("check constraint failed")
                || lowered.contains("datatype mismatch")
            {
                ServiceError::Validation(message)
            } else {
                ServiceError::Database(message)
            }
        }
    }
}
