use modkit::api::problem::{self, ProblemResponse};

use crate::domain::error::DomainError;

pub fn map_domain_error(e: &DomainError) -> ProblemResponse {
    match e {
        DomainError::CourseNotFound { .. }
        | DomainError::InternshipNotFound { .. }
        | DomainError::EventNotFound { .. }
        | DomainError::NoActivity => problem::not_found(e.to_string()),
        DomainError::Forbidden { message } => problem::forbidden(message.clone()),
        DomainError::Database { .. } => {
            tracing::error!(error = %e, "external listings internal error");
            problem::internal_error(e.to_string())
        }
    }
}
