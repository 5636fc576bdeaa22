use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Opportunity not found")]
    PostingNotFound { id: Uuid },

    #[error("Application not found")]
    ApplicationNotFound { id: Uuid },

    #[error("You have already applied for this opportunity")]
    AlreadyApplied { opportunity_id: Uuid },

    /// Authenticated but not the owner.
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
    pub fn posting_not_found(id: Uuid) -> Self {
        Self::PostingNotFound { id }
    }

    pub fn application_not_found(id: Uuid) -> Self {
        Self::ApplicationNotFound { id }
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
