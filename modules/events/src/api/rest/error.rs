use modkit::api::problem::{self, ProblemResponse};

use crate::domain::error::DomainError;

pub fn map_domain_error(e: &DomainError) -> ProblemResponse {
    match e {
        DomainError::NotFound { .. } => problem::not_found(e.to_string()),
        DomainError::AlreadyRegistered { .. } => problem::conflict(e.to_string()),
        DomainError::Full { .. } => problem::bad_request(e.to_string()),
        DomainError::NotAuthorized { message } => problem::unauthorized(message.clone()),
        DomainError::Forbidden { message } => problem::forbidden(message.clone()),
        DomainError::Validation { message } => problem::bad_request(message.clone()),
        DomainError::Identity { .. } | DomainError::Database { .. } => {
            tracing::error!(error = %e, "events internal error");
            problem::internal_error(e.to_string())
        }
    }
}
