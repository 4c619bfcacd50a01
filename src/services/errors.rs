use thiserror::Error;

use crate::forms::FieldErrors;

/// Generic error type used by service layer functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The caller did not present a valid bearer token.
    #[error("unauthorized")]
    Unauthorized,
    /// Requested resource was not found.
    #[error("not found")]
    NotFound,
    /// The request failed field-level validation.
    #[error("{0}")]
    Validation(FieldErrors),
    /// An unexpected internal error occurred.
    #[error("internal error")]
    Internal,
}

impl From<FieldErrors> for ServiceError {
    fn from(value: FieldErrors) -> Self {
        ServiceError::Validation(value)
    }
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;
