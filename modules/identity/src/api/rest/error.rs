use modkit::api::problem::{self, ProblemResponse};

use crate::domain::error::DomainError;

/// Map domain error to a problem response
pub fn map_domain_error(e: &DomainError) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { .. } | DomainError::EmailNotFound { .. } => {
            problem::not_found("User not found")
        }
        DomainError::EmailAlreadyExists { .. } => problem::conflict("User already exists"),
        DomainError::InvalidCredentials => problem::unauthorized("Invalid email or password"),
        DomainError::Validation { message } => problem::bad_request(message.clone()),
        DomainError::Database { .. } | DomainError::Hashing { .. } | DomainError::Token { .. } => {
            tracing::error!(error = %e, "identity internal error");
            problem::internal_error(e.to_string())
        }
    }
}
