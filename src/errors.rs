use sea_orm::error::DbErr;
use serde::Serialize;

/// Error type shared by every service in the crate.
///
/// Validation, authorization and not-found failures are typed declines: the
/// caller is told why the action was refused and nothing was written.
/// `DatabaseError` is the only fatal class; a transition that hits it has
/// been rolled back in full.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Concurrent modification of request {0}")]
    Conflict(i64),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn db_error(message: impl Into<String>) -> Self {
        ServiceError::DatabaseError(DbErr::Custom(message.into()))
    }

    /// Whether this error is a refused action rather than a system fault.
    /// Declines are reported back to the acting user; faults are escalated.
    pub fn is_decline(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::ValidationError(_)
                | Self::Unauthorized(_)
                | Self::Forbidden(_)
                | Self::InvalidOperation(_)
                | Self::Conflict(_)
        )
    }
}
