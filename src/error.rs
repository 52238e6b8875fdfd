/// Application-level errors
///
/// Degenerate rating data (no overlap, zero variance, no positive neighbors)
/// is never an error; these variants cover the collaborators around the engine.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = AppError::InvalidInput("limit must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: limit must be positive");
    }

    #[test]
    fn test_database_error_from_sqlx() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.to_string().starts_with("Database error:"));
    }
}
