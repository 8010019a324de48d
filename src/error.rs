use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    /// The database could not be reached at all (connection or server selection failed).
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors caused by a dependency outside this process (database, media host, mail relay).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Unavailable(_)
                | AppError::Storage(_)
                | AppError::Notify(_)
        )
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
