use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound { id: Uuid },

    #[error("User not found")]
    EmailNotFound { email: String },

    #[error("User already exists")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{message}")]
    Validation { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Password hashing failed: {message}")]
    Hashing { message: String },

    #[error("Token issuance failed: {message}")]
    Token { message: String },
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_not_found(email: impl Into<String>) -> Self {
        Self::EmailNotFound {
            email: email.into(),
        }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
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
