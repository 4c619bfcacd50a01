//! Error conversion glue between layers.
//!
//! The domain layer must not depend on repository error types, so the
//! conversions live here.

use crate::domain::types::TypeConstraintError;
use crate::repository::errors::RepositoryError;

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_errors_become_validation_errors() {
        let err: RepositoryError = TypeConstraintError::EmptyString("name").into();
        assert!(matches!(
            err,
            RepositoryError::ValidationError(message) if message == "name cannot be empty"
        ));
    }
}
