use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone)]
pub enum IdentityError {
    #[error("User not found: {id}")]
    NotFound { id: Uuid },

    #[error("Internal error")]
    Internal,
}

impl IdentityError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for IdentityError {
    fn from(e: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError;
        match e {
            DomainError::UserNotFound { id } => Self::not_found(id),
            _ => Self::internal(),
        }
    }
}
