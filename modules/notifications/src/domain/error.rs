use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Notification not found")]
    NotFound { id: Uuid },

    /// Ownership or audience check failed.
    #[error("{message}")]
    NotAuthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    NotImplemented { message: String },

    #[error("Sender lookup failed: {message}")]
    Sender { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<modkit::AuthError> for DomainError {
    fn from(e: modkit::AuthError) -> Self {
        Self::Forbidden {
            message: e.to_string(),
        }
    }
}
