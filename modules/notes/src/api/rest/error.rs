use modkit::api::problem::{self, ProblemResponse};

use crate::domain::error::DomainError;

pub fn map_domain_error(e: &DomainError) -> ProblemResponse {
    match e {
        DomainError::NotFound { .. } => problem::not_found("Note not found"),
        DomainError::Forbidden { message } => problem::forbidden(message.clone()),
        DomainError::Validation { message } => problem::bad_request(message.clone()),
        DomainError::Database { .. } => {
            tracing::error!(error = %e, "notes internal error");
            problem::internal_error(e.to_string())
        }
    }
}
