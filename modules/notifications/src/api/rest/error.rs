use modkit::api::problem::{self, ProblemResponse};

use crate::domain::error::DomainError;

pub fn map_domain_error(e: &DomainError) -> ProblemResponse {
    match e {
        DomainError::NotFound { .. } => problem::not_found("Notification not found"),
        DomainError::NotAuthorized { message } => problem::unauthorized(message.clone()),
        DomainError::Forbidden { message } => problem::forbidden(message.clone()),
        DomainError::Validation { message } => problem::bad_request(message.clone()),
        DomainError::NotImplemented { message } => problem::not_implemented(message.clone()),
        DomainError::Sender { .. } | DomainError::Database { .. } => {
            tracing::error!(error = %e, "notifications internal error");
            problem::internal_error(e.to_string())
        }
    }
}
