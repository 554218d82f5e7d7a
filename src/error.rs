use thiserror::Error;

/// Failures surfaced by the finance operations.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Username '{0}' already exists")]
    UsernameTaken(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

impl FinanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        FinanceError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FinanceError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, FinanceError>;
