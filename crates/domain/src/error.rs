//! Errors raised by collaborator ports.

use thiserror::Error;

/// Failure of a store, directory or transport collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict("Record already exists".into()),
                Some("23503") => StoreError::NotFound("Referenced record not found".into()),
                _ => StoreError::Database(db_err.to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(format!("Connection pool: {}", err))
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::InvalidData(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::NotFound("user".into()).to_string(),
            "Not found: user"
        );
        assert_eq!(
            StoreError::Unavailable("smtp".into()).to_string(),
            "Service unavailable: smtp"
        );
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: StoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(error, StoreError::NotFound("Record not found".into()));
    }

    #[test]
    fn test_from_sqlx_pool_timeout() {
        let error: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(error, StoreError::Unavailable(_)));
    }
}
