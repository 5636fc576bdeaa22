use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Event not found")]
    NotFound { id: Uuid },

    #[error("Already registered for this event")]
    AlreadyRegistered { id: Uuid },

    #[error("Event is full")]
    Full { id: Uuid },

    /// Authenticated but not the organizer of this event.
    #[error("{message}")]
    NotAuthorized { message: String },

    /// Role gate.
    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("User lookup failed: {message}")]
    Identity { message: String },

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

impl From<identity::contract::IdentityError> for DomainError {
    fn from(e: identity::contract::IdentityError) -> Self {
        Self::Identity {
            message: e.to_string(),
        }
    }
}
