use modkit::api::problem::{self, ProblemResponse};

use crate::domain::error::DomainError;

pub fn map_domain_error(e: &DomainError) -> ProblemResponse {
    match e {
        DomainError::PostingNotFound { .. } | DomainError::ApplicationNotFound { .. } => {
            problem::not_found(e.to_string())
        }
        DomainError::AlreadyApplied { .. } => problem::conflict(e.to_string()),
        DomainError::NotAuthorized { message } => problem::unauthorized(message.clone()),
        DomainError::Forbidden { message } => problem::forbidden(message.clone()),
        DomainError::Validation { message } => problem::bad_request(message.clone()),
        DomainError::Identity { .. } | DomainError::Database { .. } => {
            tracing::error!(error = %e, "opportunities internal error");
            problem::internal_error(e.to_string())
        }
    }
}
