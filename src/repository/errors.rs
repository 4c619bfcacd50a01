use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query or transaction failure reported by Diesel.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    /// A stored row no longer satisfies the domain constraints.
    #[error("validation error: {0}")]
    ValidationError(String),
    /// The row targeted by a write does not exist.
    #[error("not found")]
    NotFound,
}

/// Convenient alias for repository results.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    /// Whether the failure was a `UNIQUE` constraint rejecting the write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::Database(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}
